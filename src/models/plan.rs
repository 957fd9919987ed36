use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of tool identifiers, stable across the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Github,
    Weather,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Github => write!(f, "github"),
            ToolKind::Weather => write!(f, "weather"),
        }
    }
}

/// One tool invocation request within a plan.
///
/// `depends_on` may only reference step numbers strictly less than
/// `step_number`; the runner trusts the listed order and does not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_number: u32,

    pub description: String,

    pub tool: ToolKind,

    #[serde(default)]
    pub parameters: Value,

    #[serde(default)]
    pub depends_on: Vec<u32>,
}

/// Ordered plan produced by the planning stage. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub task_summary: String,

    #[serde(default)]
    pub reasoning: String,

    pub steps: Vec<PlanStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_kind_serde_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&ToolKind::Github).unwrap(), "\"github\"");
        assert_eq!(ToolKind::Weather.to_string(), "weather");
        let parsed: ToolKind = serde_json::from_str("\"weather\"").unwrap();
        assert_eq!(parsed, ToolKind::Weather);
    }

    #[test]
    fn plan_step_defaults_for_optional_fields() {
        let step: PlanStep = serde_json::from_value(serde_json::json!({
            "step_number": 1,
            "description": "search repos",
            "tool": "github"
        }))
        .unwrap();
        assert!(step.depends_on.is_empty());
        assert!(step.parameters.is_null());
    }
}
