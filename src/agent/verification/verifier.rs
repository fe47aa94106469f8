use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    agent::{
        planning::Plan,
        types::{ExecutionLog, OverallStatus, Verdict},
        verification::template::{template_needs_retry, templated_answer},
    },
    input::Task,
    llm::{LanguageModel, ReasoningClient},
    message::verifier::generate_verifier_message,
};

pub const SYNTHESIS_TEMPERATURE: f32 = 0.2;

static VERDICT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["final_answer", "needs_retry"],
        "properties": {
            "final_answer": {"type": "string"},
            "needs_retry": {"type": "boolean"},
            "notes": {"type": "string"}
        }
    })
});

#[derive(Debug, Deserialize)]
struct Synthesis {
    final_answer: String,
    needs_retry: bool,
    #[serde(default)]
    notes: Option<String>,
}

pub struct Verifier<M> {
    llm: Arc<ReasoningClient<M>>,
}

impl<M: LanguageModel> Verifier<M> {
    pub fn new(llm: Arc<ReasoningClient<M>>) -> Self {
        Self { llm }
    }

    /// Classifies the run and produces the answer. Never fails: a synthesis
    /// error falls back to the deterministic template.
    pub async fn verify(&self, task: &Task, plan: &Plan, log: &ExecutionLog) -> Verdict {
        let status = OverallStatus::from_log(log);
        info!(?status, "verifying execution results");

        if status == OverallStatus::Error {
            warn!("no step succeeded, skipping synthesis");
            return template_verdict(status, plan, log);
        }

        let prompt = generate_verifier_message(task, plan, log, status);
        let synthesis = self
            .llm
            .generate_structured::<Synthesis>(
                &prompt.user,
                Some(&prompt.system),
                &VERDICT_SCHEMA,
                SYNTHESIS_TEMPERATURE,
            )
            .await;

        match synthesis {
            Ok(s) if !s.final_answer.trim().is_empty() => Verdict {
                overall_status: status,
                final_answer: s.final_answer.trim().to_string(),
                needs_retry: status != OverallStatus::Success && s.needs_retry,
                notes: s.notes.filter(|n| !n.trim().is_empty()),
                synthesized: true,
            },
            Ok(_) => {
                error!("synthesis returned an empty answer, using template");
                template_verdict(status, plan, log)
            }
            Err(err) => {
                error!(error = %err, "answer synthesis failed, using template");
                template_verdict(status, plan, log)
            }
        }
    }
}

fn template_verdict(status: OverallStatus, plan: &Plan, log: &ExecutionLog) -> Verdict {
    let failed = log.failed().count();
    Verdict {
        overall_status: status,
        final_answer: templated_answer(plan, log),
        needs_retry: status != OverallStatus::Success && template_needs_retry(log),
        notes: (failed > 0).then(|| format!("{} of {} steps failed", failed, log.len())),
        synthesized: false,
    }
}
