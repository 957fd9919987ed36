//! Planning stage: LLM-generated plans with a deterministic keyword
//! fallback so planning never fails the pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::json;
use tracing::{error, info, warn};

use crate::llm::{LlmClient, generate, prompts};
use crate::models::{ExecutionPlan, PlanStep, ToolKind};

const REPO_KEYWORDS: &[&str] = &["github", "repo", "repository", "code", "project", "star"];
const WEATHER_KEYWORDS: &[&str] = &["weather", "temperature", "forecast", "climate", "rain", "sunny"];

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "find", "search", "get", "show", "list", "the", "a", "an", "for", "in", "on", "github",
        "weather", "and", "with", "top",
    ]
    .into_iter()
    .collect()
});

static KNOWN_CITIES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "new york",
        "london",
        "tokyo",
        "paris",
        "berlin",
        "sydney",
        "mumbai",
        "singapore",
        "dubai",
        "san francisco",
        "los angeles",
        "chicago",
        "seattle",
        "boston",
        "toronto",
        "vancouver",
    ]
});

pub struct Planner {
    llm: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Produces a plan for the task. Never fails: any planner-service fault
    /// or empty plan is replaced by the keyword fallback.
    pub async fn plan(&self, task: &str) -> ExecutionPlan {
        info!("Creating plan for task: {}", preview(task, 100));

        match generate::<ExecutionPlan>(self.llm.as_ref(), &prompts::planner_messages(task)).await
        {
            Ok(plan) if !plan.steps.is_empty() => {
                info!("Generated plan with {} steps", plan.steps.len());
                plan
            }
            Ok(_) => {
                warn!("Planner returned an empty plan");
                self.fallback_plan(task)
            }
            Err(e) => {
                error!("Failed to generate plan: {e}");
                self.fallback_plan(task)
            }
        }
    }

    /// Keyword-classification plan used when the LLM is unavailable.
    /// Fallback steps never carry dependencies.
    fn fallback_plan(&self, task: &str) -> ExecutionPlan {
        warn!("Using fallback plan generation");

        let task_lower = task.to_lowercase();
        let mut steps = Vec::new();
        let mut step_number = 1;

        if REPO_KEYWORDS.iter().any(|kw| task_lower.contains(kw)) {
            steps.push(PlanStep {
                step_number,
                description: "Search GitHub repositories".to_string(),
                tool: ToolKind::Github,
                parameters: json!({"query": extract_search_query(task), "limit": 5}),
                depends_on: vec![],
            });
            step_number += 1;
        }

        if WEATHER_KEYWORDS.iter().any(|kw| task_lower.contains(kw)) {
            let city = extract_city(task);
            steps.push(PlanStep {
                step_number,
                description: format!("Get weather for {city}"),
                tool: ToolKind::Weather,
                parameters: json!({"city": city}),
                depends_on: vec![],
            });
        }

        if steps.is_empty() {
            steps.push(PlanStep {
                step_number: 1,
                description: "Search GitHub for relevant repositories".to_string(),
                tool: ToolKind::Github,
                parameters: json!({"query": preview(task, 50), "limit": 5}),
                depends_on: vec![],
            });
        }

        ExecutionPlan {
            task_summary: preview(task, 200),
            reasoning: "Fallback plan generated from keyword extraction".to_string(),
            steps,
        }
    }
}

fn preview(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Strips stop words and keeps the first five remaining words.
fn extract_search_query(task: &str) -> String {
    let words: Vec<&str> = task
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w.to_lowercase().as_str()))
        .take(5)
        .collect();

    if words.is_empty() {
        "popular repositories".to_string()
    } else {
        words.join(" ")
    }
}

/// Known-city match first, then a capitalized word following "in"/"for"/"at",
/// else London.
fn extract_city(task: &str) -> String {
    let task_lower = task.to_lowercase();
    for city in KNOWN_CITIES.iter() {
        if task_lower.contains(city) {
            return title_case(city);
        }
    }

    let words: Vec<&str> = task.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if matches!(word.to_lowercase().as_str(), "in" | "for" | "at")
            && let Some(candidate) = words.get(i + 1)
        {
            let candidate = candidate.trim_matches(['.', ',', '!', '?']);
            if candidate.chars().next().is_some_and(char::is_uppercase) {
                return candidate.to_string();
            }
        }
    }

    "London".to_string()
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn fallback_planner() -> Planner {
        Planner::new(Arc::new(MockLlmClient::unavailable()))
    }

    #[tokio::test]
    async fn llm_plan_is_used_when_well_formed() {
        let mock = MockLlmClient::new();
        mock.push_ok(
            r#"{"task_summary": "repos", "reasoning": "one search", "steps": [
                {"step_number": 1, "description": "search", "tool": "github",
                 "parameters": {"query": "rust"}, "depends_on": []}
            ]}"#,
        );
        let planner = Planner::new(Arc::new(mock));

        let plan = planner.plan("find rust repos").await;
        assert_eq!(plan.task_summary, "repos");
        assert_eq!(plan.steps.len(), 1);
    }

    #[tokio::test]
    async fn malformed_llm_output_falls_back() {
        let mock = MockLlmClient::new();
        mock.push_ok("not json at all");
        let planner = Planner::new(Arc::new(mock));

        let plan = planner.plan("find rust repos on github").await;
        assert_eq!(plan.reasoning, "Fallback plan generated from keyword extraction");
        assert!(!plan.steps.is_empty());
    }

    #[tokio::test]
    async fn combined_task_yields_two_independent_steps() {
        let plan = fallback_planner()
            .plan("Find Python repos and weather in London")
            .await;

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].tool, ToolKind::Github);
        assert_eq!(plan.steps[1].tool, ToolKind::Weather);
        assert_eq!(plan.steps[1].parameters["city"], "London");
        assert!(plan.steps.iter().all(|s| s.depends_on.is_empty()));
    }

    #[tokio::test]
    async fn unclassified_task_defaults_to_repo_search() {
        let long_task = "tell me something interesting about nothing much at all really honestly";
        let plan = fallback_planner().plan(long_task).await;

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].tool, ToolKind::Github);
        let query = plan.steps[0].parameters["query"].as_str().unwrap();
        assert_eq!(query, &long_task[..50]);
    }

    #[test]
    fn search_query_strips_stop_words() {
        assert_eq!(
            extract_search_query("Find the top Python repos on github"),
            "Python repos"
        );
        assert_eq!(extract_search_query("find the top"), "popular repositories");
    }

    #[test]
    fn city_extraction_prefers_known_cities() {
        assert_eq!(extract_city("weather in new york please"), "New York");
        assert_eq!(extract_city("what is the weather for Reykjavik today"), "Reykjavik");
        assert_eq!(extract_city("how is the weather"), "London");
    }
}
