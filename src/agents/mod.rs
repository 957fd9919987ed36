pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod verifier;

pub use executor::{PlanRunner, RetryPolicy, StepExecutor};
pub use orchestrator::Orchestrator;
pub use planner::Planner;
pub use verifier::Verifier;
