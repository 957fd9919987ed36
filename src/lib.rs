pub mod agents;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod tools;
pub mod utils;

pub use agents::Orchestrator;
pub use config::Settings;
pub use error::{Error, Result};
