use serde_json::Value;

use crate::agent::{
    planning::Plan,
    types::{ExecutionLog, StepResult},
};

/// Deterministic answer built only from the step results.
pub fn templated_answer(plan: &Plan, log: &ExecutionLog) -> String {
    let mut parts = Vec::new();

    if log.succeeded().next().is_none() {
        parts.push("I was unable to complete the task because every step failed.".to_string());
    } else {
        parts.push("Here are the results:".to_string());
        for result in log.succeeded() {
            parts.push(String::new());
            parts.push(format!("{}:", step_label(plan, result)));
            if result.degraded {
                parts.push("  (from a fallback source, may be incomplete)".to_string());
            }
            match &result.output {
                Value::Object(map) => {
                    for (key, value) in map {
                        parts.push(format!("  - {}: {}", key, render(value)));
                    }
                }
                other => parts.push(format!("  - {}", render(other))),
            }
        }
    }

    let failures: Vec<&StepResult> = log.failed().collect();
    if !failures.is_empty() {
        parts.push(String::new());
        parts.push("Could not obtain:".to_string());
        for result in failures {
            let reason = result
                .error
                .as_ref()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown error");
            parts.push(format!(
                "  - {} ({}): {}",
                step_label(plan, result),
                result.tool_name,
                reason
            ));
        }
    }

    parts.join("\n")
}

/// Transient failures may clear up on a second run.
pub fn template_needs_retry(log: &ExecutionLog) -> bool {
    log.failed()
        .any(|result| result.error.as_ref().is_some_and(|e| e.kind.is_transient()))
}

fn step_label(plan: &Plan, result: &StepResult) -> String {
    plan.steps
        .get(result.step_index)
        .map(|step| step.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Step {}", result.step_index + 1))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::{
        agent::{
            planning::Step,
            types::StepFailure,
        },
        error::tool_error::FailureKind,
    };

    fn plan() -> Plan {
        let step = |index: usize, description: &str, tool: &str| Step {
            index,
            description: description.into(),
            tool_name: tool.into(),
            arguments: BTreeMap::new(),
            depends_on: vec![],
        };
        Plan {
            task_analysis: "repos and weather".into(),
            steps: vec![step(0, "Find AI repositories", "github"), step(1, "", "weather")],
        }
    }

    #[test]
    fn lists_results_and_missing_data() {
        let log = ExecutionLog::from(vec![
            StepResult::ok(0, "github", json!({"query": "ai", "total_count": 3}), false, 1),
            StepResult::failed(
                1,
                "weather",
                StepFailure {
                    kind: FailureKind::Network,
                    message: "network error: timed out".into(),
                },
                3,
            ),
        ]);
        let answer = templated_answer(&plan(), &log);
        assert!(answer.starts_with("Here are the results:"));
        assert!(answer.contains("Find AI repositories:\n  - query: ai"));
        assert!(answer.contains("Could not obtain:\n  - Step 2 (weather): network error: timed out"));
        assert!(template_needs_retry(&log));
    }

    #[test]
    fn validation_failures_do_not_ask_for_retry() {
        let log = ExecutionLog::from(vec![StepResult::failed(
            0,
            "github",
            StepFailure {
                kind: FailureKind::Validation,
                message: "missing query".into(),
            },
            1,
        )]);
        let answer = templated_answer(&plan(), &log);
        assert!(answer.starts_with("I was unable to complete the task"));
        assert!(!template_needs_retry(&log));
    }
}
