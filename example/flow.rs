use std::sync::Arc;

use opsagent::{
    Config, Orchestrator, config,
    llm::OpenAiCompatibleModel,
    tools::{ReqwestTransport, ToolRegistry},
};

const SAMPLE_TASKS: &[&str] = &[
    "Convert 100 USD to EUR",
    "Find the top 3 AI repositories on GitHub and tell me the weather in Tokyo",
    "What are the latest technology headlines?",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    config::load_env_file(None)?;
    let config = Config::from_env()?;
    let transport = Arc::new(ReqwestTransport::new(config.tool_timeout)?);
    let registry = Arc::new(ToolRegistry::with_default_tools(&config.credentials, transport)?);
    let model = OpenAiCompatibleModel::new(config.llm.clone())?;
    let orchestrator = Orchestrator::from_config(model, registry, &config);

    for task in SAMPLE_TASKS {
        println!("\n=== {} ===", task);
        let report = orchestrator.run(task).await;
        if let Some(plan) = &report.plan {
            for step in &plan.steps {
                println!("  {}. [{}] {}", step.index + 1, step.tool_name, step.description);
            }
        }
        for result in report.execution_log.iter() {
            println!(
                "  step {} -> {:?} after {} attempt(s){}",
                result.step_index + 1,
                result.status,
                result.attempt_count,
                if result.degraded { " (degraded)" } else { "" }
            );
        }
        println!("\n{}\n\nStatus: {}", report.final_answer(), report.status);
    }
    Ok(())
}
