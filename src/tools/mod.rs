pub mod github;
pub mod registry;
pub mod weather;

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::error::Result;
use crate::models::{ToolKind, ToolResult};

pub use github::GithubTool;
pub use registry::ToolRegistry;
pub use weather::WeatherTool;

/// Uniform capability contract every tool implements.
///
/// `execute` may return `Err` for internal faults; `safe_execute` is the
/// entry point the pipeline uses and guarantees a `ToolResult` comes back,
/// with wall-clock timing stamped on it and faults captured as `error` text.
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, params: &Value) -> Result<ToolResult>;

    async fn safe_execute(&self, params: &Value) -> ToolResult {
        let start = Instant::now();
        let mut result = match self.execute(params).await {
            Ok(result) => result,
            Err(e) => {
                error!("Tool {} failed: {e}", self.name());
                ToolResult::err(self.kind(), e.to_string())
            }
        };
        result.execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        result
    }
}
