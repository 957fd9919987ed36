pub mod execution;
pub mod plan;
pub mod verification;

pub use execution::{ExecutionResult, StepResult, StepStatus, ToolResult};
pub use plan::{ExecutionPlan, PlanStep, ToolKind};
pub use verification::{PipelineResponse, VerificationResult};
