use std::sync::Arc;

use chrono::Utc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    agent::{
        execution::Executor,
        planning::{Plan, Planner},
        report::TaskReport,
        types::{ExecutionLog, Verdict},
        verification::Verifier,
    },
    config::{Config, ExecutorConfig},
    error::agent_error::AgentError,
    input::Task,
    llm::{LanguageModel, ReasoningClient},
    tools::ToolRegistry,
};

/// Plan, execute, verify; then refine while the verdict asks for it and
/// the round budget allows.
pub struct Orchestrator<M> {
    registry: Arc<ToolRegistry>,
    planner: Planner<M>,
    executor: Executor,
    verifier: Verifier<M>,
    max_refinements: u32,
}

impl<M: LanguageModel> Orchestrator<M> {
    pub fn new(
        model: M,
        registry: Arc<ToolRegistry>,
        executor_config: ExecutorConfig,
        max_refinements: u32,
    ) -> Self {
        let llm = Arc::new(ReasoningClient::new(model));
        Self {
            planner: Planner::new(llm.clone()),
            verifier: Verifier::new(llm),
            executor: Executor::new(registry.clone(), executor_config),
            registry,
            max_refinements,
        }
    }

    pub fn from_config(model: M, registry: Arc<ToolRegistry>, config: &Config) -> Self {
        Self::new(model, registry, config.executor.clone(), config.max_refinements)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs one task. Only planning failures of the first round are errors;
    /// everything after that ends up in the report.
    pub async fn execute_task(&self, task: &Task) -> Result<TaskReport, AgentError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("task", %run_id);
        self.execute_with_id(run_id, task).instrument(span).await
    }

    /// Like [`execute_task`](Self::execute_task) but always returns a report.
    pub async fn run(&self, task: &str) -> TaskReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let outcome = match Task::new(task) {
            Ok(task) => {
                self.execute_with_id(run_id, &task)
                    .instrument(info_span!("task", %run_id))
                    .await
            }
            Err(err) => Err(err),
        };
        outcome.unwrap_or_else(|err| {
            warn!(%run_id, error = %err, "task failed before execution");
            TaskReport::from_failure(run_id, task, &err, started_at)
        })
    }

    async fn execute_with_id(&self, run_id: Uuid, task: &Task) -> Result<TaskReport, AgentError> {
        let started_at = Utc::now();
        let tools = self.registry.list();
        info!(task = %task, "task received");

        let mut plan = self.planner.plan(task, &tools).await?;
        let mut log = self.executor.run(&plan).await;
        let mut verdict = self.verifier.verify(task, &plan, &log).await;
        let mut refinements = 0;

        while verdict.needs_retry && refinements < self.max_refinements {
            let feedback = refinement_feedback(&plan, &log, &verdict);
            info!(round = refinements + 1, "verdict asks for a retry, refining plan");
            match self.planner.refine(&plan, &feedback, &tools).await {
                Ok(refined) => {
                    refinements += 1;
                    log = self.executor.run(&refined).await;
                    verdict = self.verifier.verify(task, &refined, &log).await;
                    plan = refined;
                }
                Err(err) => {
                    warn!(error = %err, "refinement failed, keeping previous results");
                    break;
                }
            }
        }

        info!(status = ?verdict.overall_status, refinements, "task finished");
        Ok(TaskReport {
            run_id,
            task: task.to_string(),
            status: verdict.overall_status,
            plan: Some(plan),
            execution_log: log,
            verdict,
            refinements,
            error: None,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn refinement_feedback(plan: &Plan, log: &ExecutionLog, verdict: &Verdict) -> String {
    let mut lines = Vec::new();
    if let Some(notes) = &verdict.notes {
        lines.push(notes.clone());
    }
    for result in log.failed() {
        let description = plan
            .steps
            .get(result.step_index)
            .map(|s| s.description.as_str())
            .unwrap_or("");
        let reason = result
            .error
            .as_ref()
            .map(|e| format!("{:?}: {}", e.kind, e.message))
            .unwrap_or_default();
        lines.push(format!(
            "Step {} ({}, {}) failed after {} attempt(s): {}",
            result.step_index + 1,
            result.tool_name,
            description,
            result.attempt_count,
            reason
        ));
    }
    lines.join("\n")
}
