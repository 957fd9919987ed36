use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::execution::ExecutionResult;
use crate::models::plan::ExecutionPlan;

/// Assessment of a run against the original task. Produced fresh on every
/// verification pass; replaced, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_valid: bool,

    pub completeness_score: f64,

    #[serde(default)]
    pub issues: Vec<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    #[serde(default)]
    pub final_output: Value,

    pub formatted_response: String,
}

/// Terminal artifact returned to the caller of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub run_id: Uuid,

    pub task: String,

    pub plan: ExecutionPlan,

    pub execution: ExecutionResult,

    pub verification: VerificationResult,

    pub started_at: DateTime<Utc>,

    pub total_time_ms: f64,

    pub success: bool,
}
