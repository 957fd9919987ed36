//! Pipeline orchestration: plan, execute, verify, single-pass recovery of
//! failed steps, and an outer whole-pipeline retry layer.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::executor::{PlanRunner, RetryPolicy};
use crate::agents::planner::Planner;
use crate::agents::verifier::Verifier;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{
    ExecutionPlan, ExecutionResult, PipelineResponse, StepResult, StepStatus, VerificationResult,
};
use crate::tools::{GithubTool, ToolRegistry, WeatherTool};

type PlanCallback = Box<dyn Fn(&ExecutionPlan) + Send + Sync>;
type VerificationCallback = Box<dyn Fn(&VerificationResult) + Send + Sync>;

/// Sequences the planner, runner and verifier for one task at a time.
/// Owns the run result exclusively; recovery is the only place it mutates.
pub struct Orchestrator {
    planner: Planner,
    runner: PlanRunner,
    verifier: Verifier,
    on_plan_created: Option<PlanCallback>,
    on_verification_complete: Option<VerificationCallback>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>, policy: RetryPolicy) -> Self {
        Self {
            planner: Planner::new(llm.clone()),
            runner: PlanRunner::new(registry, policy),
            verifier: Verifier::new(llm),
            on_plan_created: None,
            on_verification_complete: None,
        }
    }

    /// Composition root: registers the GitHub and weather tools and derives
    /// the retry policy from settings.
    pub fn with_default_tools(llm: Arc<dyn LlmClient>, settings: &Settings) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(GithubTool::new(settings)?));
        registry.register(Arc::new(WeatherTool::new(settings)?));
        info!("Registered {} tools", registry.len());

        let policy = RetryPolicy {
            max_attempts: settings.max_retries,
            backoff_unit: std::time::Duration::from_secs(settings.retry_backoff_secs),
        };

        Ok(Self::new(llm, Arc::new(registry), policy))
    }

    pub fn set_on_plan_created(&mut self, callback: impl Fn(&ExecutionPlan) + Send + Sync + 'static) {
        self.on_plan_created = Some(Box::new(callback));
    }

    pub fn set_on_verification_complete(
        &mut self,
        callback: impl Fn(&VerificationResult) + Send + Sync + 'static,
    ) {
        self.on_verification_complete = Some(Box::new(callback));
    }

    /// Runs the full pipeline once: plan, execute, verify, and a single
    /// recovery pass over failed steps when the run came back incomplete.
    pub async fn run(&self, task: &str) -> PipelineResponse {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        info!(%run_id, "Starting pipeline for task: {}", preview(task, 100));

        info!("Phase 1: Planning");
        let plan = self.planner.plan(task).await;
        self.notify_plan_created(&plan);

        info!("Phase 2: Execution");
        let mut execution = self.runner.run(&plan).await;

        info!("Phase 3: Verification");
        let mut verification = self.verifier.verify(task, &execution).await;

        if !execution.success && verification.completeness_score < 1.0 {
            info!("Phase 4: Recovering failed steps");
            verification = self.recover(task, &plan, &mut execution, verification).await;
        }

        self.notify_verification_complete(&verification);

        let total_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let success = verification.is_valid && execution.success;
        info!(%run_id, "Pipeline complete in {total_time_ms:.0}ms, success={success}");

        PipelineResponse {
            run_id,
            task: task.to_string(),
            plan,
            execution,
            verification,
            started_at,
            total_time_ms,
            success,
        }
    }

    /// Re-executes every currently failed step exactly once against the
    /// pre-recovery dependency snapshot, then re-verifies.
    ///
    /// The snapshot is deliberately not refreshed between retries: a step
    /// whose dependency failed stays failed even if that dependency recovers
    /// in the same pass. Recovery is single-pass, not transitive.
    async fn recover(
        &self,
        task: &str,
        plan: &ExecutionPlan,
        execution: &mut ExecutionResult,
        verification: VerificationResult,
    ) -> VerificationResult {
        let failed: Vec<u32> = execution
            .step_results
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .map(|r| r.step_number)
            .collect();

        if failed.is_empty() {
            return verification;
        }
        info!("Re-executing {} failed steps", failed.len());

        let snapshot: HashMap<u32, StepResult> = execution
            .step_results
            .iter()
            .map(|r| (r.step_number, r.clone()))
            .collect();

        for step in plan.steps.iter().filter(|s| failed.contains(&s.step_number)) {
            let retried = self
                .runner
                .step_executor()
                .execute_step(step, &snapshot)
                .await;
            if let Some(slot) = execution
                .step_results
                .iter_mut()
                .find(|r| r.step_number == step.step_number)
            {
                *slot = retried;
            }
        }

        execution.recompute_flags();
        self.verifier.verify(task, execution).await
    }

    /// Repeats the whole pipeline up to `max_attempts` times, returning the
    /// first fully successful response, else the best-scoring attempt.
    pub async fn run_with_retry(&self, task: &str, max_attempts: u32) -> PipelineResponse {
        info!("Attempt 1/{max_attempts}");
        let mut best = self.run(task).await;
        if best.success {
            return best;
        }

        for attempt in 2..=max_attempts {
            info!("Retrying due to incomplete results");
            info!("Attempt {attempt}/{max_attempts}");
            let response = self.run(task).await;
            if response.success {
                return response;
            }
            if response.verification.completeness_score > best.verification.completeness_score {
                best = response;
            }
        }

        best
    }

    /// Caller-facing boundary consumed by presentation layers.
    pub async fn run_task(&self, task: &str, retry_on_failure: bool) -> PipelineResponse {
        if retry_on_failure {
            self.run_with_retry(task, 2).await
        } else {
            self.run(task).await
        }
    }

    fn notify_plan_created(&self, plan: &ExecutionPlan) {
        if let Some(callback) = &self.on_plan_created
            && catch_unwind(AssertUnwindSafe(|| callback(plan))).is_err()
        {
            warn!("plan-created callback panicked, continuing");
        }
    }

    fn notify_verification_complete(&self, verification: &VerificationResult) {
        if let Some(callback) = &self.on_verification_complete
            && catch_unwind(AssertUnwindSafe(|| callback(verification))).is_err()
        {
            warn!("verification-complete callback panicked, continuing");
        }
    }
}

fn preview(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
