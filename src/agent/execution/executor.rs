use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    agent::{
        execution::resolve::resolve_arguments,
        planning::{Plan, Step},
        types::{ExecutionLog, StepFailure, StepResult},
    },
    config::ExecutorConfig,
    error::tool_error::FailureKind,
    tools::ToolRegistry,
};

/// Runs plan steps strictly in order, one tool call at a time.
pub struct Executor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    /// Always yields one result per step; tool failures never abort the run.
    pub async fn run(&self, plan: &Plan) -> ExecutionLog {
        let mut log = ExecutionLog::new();
        for step in &plan.steps {
            let result = self.run_step(step, &log).await;
            log.push(result);
        }
        let ok = log.succeeded().count();
        info!(steps = log.len(), ok, failed = log.len() - ok, "plan executed");
        log
    }

    async fn run_step(&self, step: &Step, log: &ExecutionLog) -> StepResult {
        let number = step.index + 1;
        let arguments = match resolve_arguments(step, log) {
            Ok(arguments) => arguments,
            Err(failure) => {
                warn!(step = number, tool = %step.tool_name, reason = %failure.message, "step skipped");
                return StepResult::failed(step.index, &step.tool_name, failure, 1);
            }
        };

        let tool = match self.registry.get(&step.tool_name) {
            Ok(tool) => tool,
            Err(err) => {
                error!(step = number, error = %err, "step names an unregistered tool");
                let failure = StepFailure {
                    kind: FailureKind::Validation,
                    message: err.to_string(),
                };
                return StepResult::failed(step.index, &step.tool_name, failure, 1);
            }
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            info!(step = number, tool = %step.tool_name, attempt, "executing step");
            match tool.execute(&arguments).await {
                Ok(output) => {
                    if output.degraded {
                        warn!(step = number, tool = %step.tool_name, "step produced a degraded result");
                    }
                    return StepResult::ok(step.index, &step.tool_name, output.data, output.degraded, attempt);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(step = number, attempt, error = %err, "step attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => {
                    error!(step = number, attempt, error = %err, "step failed");
                    return StepResult::failed(step.index, &step.tool_name, StepFailure::from(&err), attempt);
                }
            }
        }
    }
}
