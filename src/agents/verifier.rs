//! Verification stage: LLM assessment of a run with a deterministic
//! fallback scorer and report formatter.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::llm::{LlmClient, generate, prompts};
use crate::models::{ExecutionPlan, ExecutionResult, StepStatus, VerificationResult};
use crate::utils::{format_thousands, truncate_chars};

const PAYLOAD_PREVIEW_CHARS: usize = 1000;

pub struct Verifier {
    llm: Arc<dyn LlmClient>,
}

impl Verifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Assesses the run against the task. Never fails: any LLM fault lands
    /// on the deterministic fallback, with no retry at this layer.
    pub async fn verify(&self, task: &str, execution: &ExecutionResult) -> VerificationResult {
        info!("Verifying execution results");

        let plan_digest = summarize_plan(&execution.plan);
        let results_digest = summarize_results(execution);
        let messages = prompts::verifier_messages(task, &plan_digest, &results_digest);

        match generate::<VerificationResult>(self.llm.as_ref(), &messages).await {
            Ok(verification) => {
                info!(
                    "Verification complete: score={:.2}",
                    verification.completeness_score
                );
                verification
            }
            Err(e) => {
                error!("LLM verification failed: {e}");
                self.fallback_verification(execution)
            }
        }
    }

    /// Pure function of the run result: re-verifying an unmodified run
    /// yields an identical outcome.
    pub fn fallback_verification(&self, execution: &ExecutionResult) -> VerificationResult {
        warn!("Using fallback verification");

        let total = execution.step_results.len();
        let completed = execution.completed_count();
        let completeness_score = if total > 0 {
            completed as f64 / total as f64
        } else {
            0.0
        };

        let issues: Vec<String> = execution
            .step_results
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .map(|r| {
                format!(
                    "Step {} failed: {}",
                    r.step_number,
                    r.error_message.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();

        let final_output = build_final_output(execution);
        let formatted_response = format_response(&final_output, &issues);

        VerificationResult {
            is_valid: completeness_score > 0.5,
            completeness_score,
            issues,
            suggestions: vec![],
            final_output,
            formatted_response,
        }
    }
}

fn summarize_plan(plan: &ExecutionPlan) -> String {
    let mut lines = vec![format!("Task: {}", plan.task_summary), "Steps:".to_string()];
    for step in &plan.steps {
        lines.push(format!(
            "  {}. {} (tool: {})",
            step.step_number, step.description, step.tool
        ));
    }
    lines.join("\n")
}

fn summarize_results(execution: &ExecutionResult) -> String {
    let mut lines = Vec::new();
    for result in &execution.step_results {
        lines.push(format!("Step {}: {}", result.step_number, result.status));

        if let Some(tool_result) = &result.tool_result
            && let Some(data) = &tool_result.data
        {
            let rendered = serde_json::to_string_pretty(data).unwrap_or_default();
            lines.push(format!(
                "  Data: {}",
                truncate_chars(&rendered, PAYLOAD_PREVIEW_CHARS)
            ));
        }

        if let Some(error) = &result.error_message {
            lines.push(format!("  Error: {error}"));
        }
    }
    lines.join("\n")
}

/// Merges each completed step's payload under its tool key and builds a
/// one-line summary from the recognized tool payloads.
fn build_final_output(execution: &ExecutionResult) -> Value {
    let mut data = Map::new();

    for result in &execution.step_results {
        if result.status != StepStatus::Completed {
            continue;
        }
        let Some(tool_result) = &result.tool_result else {
            continue;
        };
        let Some(payload) = &tool_result.data else {
            continue;
        };
        data.insert(tool_result.tool.to_string(), payload.clone());
    }

    let mut parts = Vec::new();
    if let Some(github) = data.get("github") {
        let count = github["repositories"].as_array().map_or(0, Vec::len);
        parts.push(format!("Found {count} GitHub repositories"));
    }
    if let Some(weather) = data.get("weather") {
        let city = weather["city"].as_str().unwrap_or("Unknown");
        let temp = display_number(weather.get("temperature_celsius"));
        parts.push(format!("Weather in {city}: {temp}C"));
    }

    let summary = if parts.is_empty() {
        "Task completed".to_string()
    } else {
        parts.join(". ")
    };

    json!({"summary": summary, "data": data})
}

/// Fixed-layout text report: repositories, then weather, then issues.
/// Blocks are omitted entirely when their data source is absent.
fn format_response(output: &Value, issues: &[String]) -> String {
    let banner = "=".repeat(50);
    let rule = "-".repeat(30);
    let mut lines = vec![banner.clone(), "RESULTS".to_string(), banner.clone(), String::new()];

    if let Some(github) = output["data"].get("github") {
        lines.push("GITHUB REPOSITORIES:".to_string());
        lines.push(rule.clone());

        let repos = github["repositories"].as_array().cloned().unwrap_or_default();
        for repo in repos.iter().take(5) {
            lines.push(format!(
                "  {}",
                repo["full_name"].as_str().unwrap_or("Unknown")
            ));
            lines.push(format!(
                "    Stars: {}",
                format_thousands(repo["stars"].as_u64().unwrap_or(0))
            ));
            let description = repo["description"].as_str().unwrap_or("No description");
            lines.push(format!("    {}", truncate_chars(description, 80)));
            lines.push(String::new());
        }
    }

    if let Some(weather) = output["data"].get("weather") {
        lines.push("WEATHER:".to_string());
        lines.push(rule.clone());
        lines.push(format!(
            "  Location: {}, {}",
            weather["city"].as_str().unwrap_or("Unknown"),
            weather["country"].as_str().unwrap_or_default()
        ));
        lines.push(format!(
            "  Temperature: {}C / {}F",
            display_number(weather.get("temperature_celsius")),
            display_number(weather.get("temperature_fahrenheit"))
        ));
        lines.push(format!(
            "  Feels Like: {}C",
            display_number(weather.get("feels_like_celsius"))
        ));
        lines.push(format!(
            "  Humidity: {}%",
            display_number(weather.get("humidity"))
        ));
        lines.push(format!(
            "  Conditions: {}",
            weather["description"].as_str().unwrap_or("Unknown")
        ));
        lines.push(format!(
            "  Wind Speed: {} m/s",
            display_number(weather.get("wind_speed_mps"))
        ));
        lines.push(String::new());
    }

    if !issues.is_empty() {
        lines.push("ISSUES:".to_string());
        lines.push(rule);
        for issue in issues {
            lines.push(format!("  - {issue}"));
        }
        lines.push(String::new());
    }

    lines.push(banner);
    lines.join("\n")
}

fn display_number(value: Option<&Value>) -> String {
    match value.and_then(Value::as_f64) {
        Some(n) => format!("{n}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::models::{ExecutionPlan, StepResult, ToolKind, ToolResult};

    fn verifier() -> Verifier {
        Verifier::new(Arc::new(MockLlmClient::unavailable()))
    }

    fn execution(step_results: Vec<StepResult>) -> ExecutionResult {
        let mut result = ExecutionResult {
            plan: ExecutionPlan {
                task_summary: "test".into(),
                reasoning: String::new(),
                steps: vec![],
            },
            step_results,
            total_execution_time_ms: 0.0,
            success: false,
            partial_success: false,
        };
        result.recompute_flags();
        result
    }

    fn github_result(step_number: u32) -> StepResult {
        StepResult::completed(
            step_number,
            ToolResult::ok(
                ToolKind::Github,
                json!({
                    "total_count": 42,
                    "repositories": [
                        {"full_name": "tokio-rs/tokio", "stars": 25123,
                         "description": "A runtime for writing reliable async applications"},
                        {"full_name": "serde-rs/serde", "stars": 8000,
                         "description": null},
                    ],
                }),
            ),
            0,
        )
    }

    fn weather_result(step_number: u32) -> StepResult {
        StepResult::completed(
            step_number,
            ToolResult::ok(
                ToolKind::Weather,
                json!({
                    "city": "London", "country": "GB",
                    "temperature_celsius": 15.5, "temperature_fahrenheit": 59.9,
                    "feels_like_celsius": 14.9, "humidity": 72,
                    "description": "Light rain", "wind_speed_mps": 4.1,
                    "visibility_km": 9.4,
                }),
            ),
            0,
        )
    }

    #[test]
    fn score_is_completed_over_total() {
        let verification = verifier().fallback_verification(&execution(vec![
            github_result(1),
            weather_result(2),
            github_result(3),
            StepResult::failed(4, 3, "boom"),
        ]));

        assert_eq!(verification.completeness_score, 0.75);
        assert!(verification.is_valid);
        assert_eq!(verification.issues, vec!["Step 4 failed: boom"]);
        assert!(verification.suggestions.is_empty());
    }

    #[test]
    fn empty_run_scores_zero() {
        let verification = verifier().fallback_verification(&execution(vec![]));
        assert_eq!(verification.completeness_score, 0.0);
        assert!(!verification.is_valid);
    }

    #[test]
    fn half_score_is_not_valid() {
        let verification = verifier().fallback_verification(&execution(vec![
            github_result(1),
            StepResult::failed(2, 3, "boom"),
        ]));
        assert_eq!(verification.completeness_score, 0.5);
        assert!(!verification.is_valid);
    }

    #[test]
    fn fallback_is_idempotent() {
        let run = execution(vec![github_result(1), StepResult::failed(2, 3, "boom")]);
        let first = verifier().fallback_verification(&run);
        let second = verifier().fallback_verification(&run);

        assert_eq!(first.completeness_score, second.completeness_score);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.is_valid, second.is_valid);
        assert_eq!(first.formatted_response, second.formatted_response);
    }

    #[test]
    fn summary_names_recognized_payloads() {
        let run = execution(vec![github_result(1), weather_result(2)]);
        let output = build_final_output(&run);
        assert_eq!(
            output["summary"],
            "Found 2 GitHub repositories. Weather in London: 15.5C"
        );

        let bare = execution(vec![StepResult::completed(
            1,
            ToolResult {
                tool: ToolKind::Github,
                success: true,
                data: None,
                error: None,
                execution_time_ms: 0.0,
            },
            0,
        )]);
        assert_eq!(build_final_output(&bare)["summary"], "Task completed");
    }

    #[test]
    fn report_contains_sections_in_fixed_order() {
        let run = execution(vec![
            github_result(1),
            weather_result(2),
            StepResult::failed(3, 3, "boom"),
        ]);
        let verification = verifier().fallback_verification(&run);
        let report = &verification.formatted_response;

        let repos_at = report.find("GITHUB REPOSITORIES:").unwrap();
        let weather_at = report.find("WEATHER:").unwrap();
        let issues_at = report.find("ISSUES:").unwrap();
        assert!(repos_at < weather_at && weather_at < issues_at);

        assert!(report.contains("Stars: 25,123"));
        assert!(report.contains("Location: London, GB"));
        assert!(report.contains("- Step 3 failed: boom"));
        assert!(report.starts_with(&"=".repeat(50)));
        assert!(report.ends_with(&"=".repeat(50)));
    }

    #[test]
    fn report_omits_absent_sections() {
        let run = execution(vec![weather_result(1)]);
        let verification = verifier().fallback_verification(&run);
        let report = &verification.formatted_response;

        assert!(!report.contains("GITHUB REPOSITORIES:"));
        assert!(report.contains("WEATHER:"));
        assert!(!report.contains("ISSUES:"));
    }

    #[test]
    fn long_descriptions_are_truncated_in_report() {
        let run = execution(vec![StepResult::completed(
            1,
            ToolResult::ok(
                ToolKind::Github,
                json!({"repositories": [{
                    "full_name": "x/y", "stars": 1,
                    "description": "d".repeat(120),
                }]}),
            ),
            0,
        )]);
        let verification = verifier().fallback_verification(&run);
        let line = verification
            .formatted_response
            .lines()
            .find(|l| l.trim_start().starts_with('d'))
            .unwrap();
        assert!(line.trim_start().chars().count() <= 80);
        assert!(line.ends_with("..."));
    }

    #[tokio::test]
    async fn llm_verdict_is_used_when_parseable() {
        let mock = MockLlmClient::new();
        mock.push_ok(
            r#"{"is_valid": true, "completeness_score": 0.9,
                "issues": [], "suggestions": ["add forks"],
                "final_output": {"summary": "ok", "data": {}},
                "formatted_response": "all good"}"#,
        );
        let verifier = Verifier::new(Arc::new(mock));

        let verification = verifier.verify("task", &execution(vec![github_result(1)])).await;
        assert_eq!(verification.completeness_score, 0.9);
        assert_eq!(verification.formatted_response, "all good");
    }

    #[tokio::test]
    async fn malformed_llm_verdict_falls_back() {
        let mock = MockLlmClient::new();
        mock.push_ok("{broken json");
        let verifier = Verifier::new(Arc::new(mock));

        let verification = verifier.verify("task", &execution(vec![github_result(1)])).await;
        assert_eq!(verification.completeness_score, 1.0);
        assert!(verification.is_valid);
    }

    #[test]
    fn results_digest_truncates_large_payloads() {
        let big = json!({"blob": "z".repeat(3000)});
        let run = execution(vec![StepResult::completed(
            1,
            ToolResult::ok(ToolKind::Github, big),
            0,
        )]);
        let digest = summarize_results(&run);
        assert!(digest.contains("..."));
        assert!(digest.chars().count() < PAYLOAD_PREVIEW_CHARS + 100);
    }
}
