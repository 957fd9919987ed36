use std::sync::Arc;

use tracing::{Level, info, warn};

use opsagent::agents::Orchestrator;
use opsagent::config::Settings;
use opsagent::llm::OpenAiChatClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let retry_on_failure = args.iter().any(|a| a == "--retry");
    let task: String = args
        .iter()
        .filter(|a| *a != "--retry")
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    if task.trim().is_empty() {
        eprintln!("Usage: opsagent [--retry] <task description>");
        std::process::exit(2);
    }

    let settings = Settings::from_env();
    let status = settings.validate();
    if !status.openai_configured {
        warn!("OpenAI API key not configured; planning and verification will use fallbacks");
    }
    if !status.weather_configured {
        warn!("OpenWeatherMap API key not configured");
    }

    let llm = Arc::new(OpenAiChatClient::new(&settings)?);
    let orchestrator = Orchestrator::with_default_tools(llm, &settings)?;

    info!("Running task: {task}");
    let response = orchestrator.run_task(&task, retry_on_failure).await;

    println!("{}", response.verification.formatted_response);
    println!(
        "steps: {}/{} completed | score: {:.2} | success: {} | {:.0}ms",
        response.execution.completed_count(),
        response.execution.step_results.len(),
        response.verification.completeness_score,
        response.success,
        response.total_time_ms,
    );

    Ok(())
}
