use std::sync::Arc;

use clap::{CommandFactory, Parser, error::ErrorKind};
use opsagent::{
    Config, Orchestrator, api, config,
    llm::OpenAiCompatibleModel,
    tools::{ReqwestTransport, ToolRegistry},
};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "opsagent", version, about = "Plan, execute and verify tasks against public APIs")]
struct Cli {
    /// Task to run, e.g. "Convert 100 USD to EUR"
    #[arg(required_unless_present = "api")]
    task: Option<String>,

    /// Debug logging and the full JSON report
    #[arg(short, long)]
    verbose: bool,

    /// Start the REST server instead of running a single task
    #[arg(long)]
    api: bool,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    config::load_env_file(None)?;
    let config = Config::from_env()?;
    let transport = Arc::new(ReqwestTransport::new(config.tool_timeout)?);
    let registry = Arc::new(ToolRegistry::with_default_tools(&config.credentials, transport)?);
    let model = OpenAiCompatibleModel::new(config.llm.clone())?;
    let orchestrator = Arc::new(Orchestrator::from_config(model, registry, &config));

    if cli.api {
        let host = cli.host.unwrap_or_else(|| config.host.clone());
        let port = cli.port.unwrap_or(config.port);
        api::serve(orchestrator, &host, port).await?;
        return Ok(());
    }

    let Some(task) = cli.task else {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "give a task to run, or --api to start the server")
            .exit();
    };
    let report = orchestrator.run(&task).await;
    println!("{}", report.final_answer());
    println!("\nStatus: {}", report.status);
    if cli.verbose {
        println!("\n{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_is_required_without_api_flag() {
        let err = Cli::try_parse_from(["opsagent"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        let err = Cli::try_parse_from(["opsagent", "--verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn api_flag_or_task_is_enough() {
        let cli = Cli::try_parse_from(["opsagent", "--api", "--port", "9000"]).unwrap();
        assert!(cli.api && cli.task.is_none());
        assert_eq!(cli.port, Some(9000));

        let cli = Cli::try_parse_from(["opsagent", "Convert 100 USD to EUR"]).unwrap();
        assert_eq!(cli.task.as_deref(), Some("Convert 100 USD to EUR"));
    }
}
