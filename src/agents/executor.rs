//! Step execution: dependency checks, bounded retries with linear backoff,
//! and sequential plan running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};

use crate::models::{ExecutionPlan, ExecutionResult, PlanStep, StepResult, ToolKind, ToolResult};
use crate::tools::ToolRegistry;

/// Explicit retry policy applied to every tool invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: 1x, 2x, 3x the unit before retries 1, 2, 3.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        self.backoff_unit * retry_index
    }
}

/// Executes one plan step against the registry.
pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
    policy: RetryPolicy,
}

impl StepExecutor {
    pub fn new(registry: Arc<ToolRegistry>, policy: RetryPolicy) -> Self {
        Self { registry, policy }
    }

    /// Runs a single step. Dependency and lookup failures short-circuit
    /// without touching the tool; execution faults are retried up to the
    /// policy's budget with a non-blocking wait between attempts.
    pub async fn execute_step(
        &self,
        step: &PlanStep,
        dependency_results: &HashMap<u32, StepResult>,
    ) -> StepResult {
        if !dependencies_met(&step.depends_on, dependency_results) {
            return StepResult::failed(step.step_number, 0, "Dependencies not met");
        }

        let Some(tool) = self.registry.get(step.tool) else {
            return StepResult::failed(
                step.step_number,
                0,
                format!("Tool not found: {}", step.tool),
            );
        };

        let mut retry_count = 0;
        let mut last_error: Option<String> = None;

        while retry_count < self.policy.max_attempts {
            let outcome = tool.safe_execute(&step.parameters).await;

            if outcome.success {
                return StepResult::completed(step.step_number, outcome, retry_count);
            }

            last_error = outcome.error;
            retry_count += 1;
            warn!(
                "Step {} failed, retry {}/{}",
                step.step_number, retry_count, self.policy.max_attempts
            );

            if retry_count < self.policy.max_attempts {
                tokio::time::sleep(self.policy.delay_for(retry_count)).await;
            }
        }

        StepResult::failed(
            step.step_number,
            retry_count,
            last_error.unwrap_or_else(|| "Max retries exceeded".to_string()),
        )
    }
}

fn dependencies_met(depends_on: &[u32], results: &HashMap<u32, StepResult>) -> bool {
    depends_on.iter().all(|dep| {
        results
            .get(dep)
            .is_some_and(|r| r.status == crate::models::StepStatus::Completed)
    })
}

/// Runs a plan's steps strictly in listed order and aggregates the outcome.
pub struct PlanRunner {
    registry: Arc<ToolRegistry>,
    executor: StepExecutor,
}

impl PlanRunner {
    pub fn new(registry: Arc<ToolRegistry>, policy: RetryPolicy) -> Self {
        Self {
            executor: StepExecutor::new(registry.clone(), policy),
            registry,
        }
    }

    pub fn step_executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub async fn run(&self, plan: &ExecutionPlan) -> ExecutionResult {
        info!("Executing plan with {} steps", plan.steps.len());
        let started = Instant::now();

        let mut step_results = Vec::with_capacity(plan.steps.len());
        let mut completed: HashMap<u32, StepResult> = HashMap::new();

        for step in &plan.steps {
            info!("Executing step {}: {}", step.step_number, step.description);
            let result = self.executor.execute_step(step, &completed).await;
            completed.insert(step.step_number, result.clone());
            step_results.push(result);
        }

        let mut result = ExecutionResult {
            plan: plan.clone(),
            step_results,
            total_execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            success: false,
            partial_success: false,
        };
        result.recompute_flags();

        info!(
            "Execution complete: {}/{} steps succeeded",
            result.completed_count(),
            result.step_results.len()
        );
        result
    }

    /// Direct single-tool invocation, bypassing plans. "Tool not found" is
    /// its only defined error; the tool reports everything else itself.
    pub async fn execute_tool(&self, kind: ToolKind, params: &Value) -> ToolResult {
        match self.registry.get(kind) {
            Some(tool) => tool.safe_execute(params).await,
            None => ToolResult::err(kind, format!("Tool not found: {kind}")),
        }
    }
}
