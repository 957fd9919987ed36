use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::plan::{ExecutionPlan, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a single tool invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: ToolKind,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub execution_time_ms: f64,
}

impl ToolResult {
    pub fn ok(tool: ToolKind, data: Value) -> Self {
        Self {
            tool,
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms: 0.0,
        }
    }

    pub fn err(tool: ToolKind, error: impl Into<String>) -> Self {
        Self {
            tool,
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms: 0.0,
        }
    }
}

/// Terminal record for one plan step.
///
/// `retry_count` counts retries performed, not attempts: it stays 0 when the
/// first attempt succeeds and equals the retry budget after exhaustion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_number: u32,

    pub status: StepStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StepResult {
    pub fn completed(step_number: u32, tool_result: ToolResult, retry_count: u32) -> Self {
        Self {
            step_number,
            status: StepStatus::Completed,
            tool_result: Some(tool_result),
            retry_count,
            error_message: None,
        }
    }

    pub fn failed(step_number: u32, retry_count: u32, error: impl Into<String>) -> Self {
        Self {
            step_number,
            status: StepStatus::Failed,
            tool_result: None,
            retry_count,
            error_message: Some(error.into()),
        }
    }
}

/// Aggregated result of running a plan. The orchestrator is the only
/// component allowed to mutate this after the run (during recovery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan: ExecutionPlan,

    pub step_results: Vec<StepResult>,

    pub total_execution_time_ms: f64,

    pub success: bool,

    pub partial_success: bool,
}

impl ExecutionResult {
    pub fn completed_count(&self) -> usize {
        self.step_results
            .iter()
            .filter(|r| r.status == StepStatus::Completed)
            .count()
    }

    /// Recomputes `success` / `partial_success` from the current step list.
    pub fn recompute_flags(&mut self) {
        let completed = self.completed_count();
        self.success = completed == self.step_results.len();
        self.partial_success = completed > 0 && !self.success;
    }
}
