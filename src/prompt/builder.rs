use serde_json::{Value, json};

use crate::{
    agent::{planning::Plan, types::ExecutionLog},
    input::Task,
    tools::ToolSpec,
};

pub fn build_task_prompt(task: &Task) -> String {
    format!("Task: {}", task)
}

pub fn build_tools_prompt(tools: &[ToolSpec]) -> String {
    let catalogue = serde_json::to_string_pretty(tools).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Available tools:\n{}\n\nIMPORTANT: These are the ONLY tools available. Do not use or reference any other tools.",
        catalogue
    )
}

/// Successful outputs keyed by step description, plus a list of what failed.
pub fn build_results_prompt(plan: &Plan, log: &ExecutionLog) -> String {
    let describe = |index: usize| {
        plan.steps
            .get(index)
            .map(|step| step.description.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Step {}", index + 1))
    };

    let succeeded: Vec<Value> = log
        .succeeded()
        .map(|result| {
            json!({
                "step": describe(result.step_index),
                "tool": result.tool_name,
                "degraded": result.degraded,
                "data": result.output,
            })
        })
        .collect();

    let failed: Vec<String> = log
        .failed()
        .map(|result| {
            let reason = result
                .error
                .as_ref()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown error");
            format!("- {} ({}): {}", describe(result.step_index), result.tool_name, reason)
        })
        .collect();

    let mut prompt = format!(
        "Execution Results:\n{}",
        serde_json::to_string_pretty(&succeeded).unwrap_or_else(|_| "[]".to_string())
    );
    if !failed.is_empty() {
        prompt.push_str("\n\nSteps that failed:\n");
        prompt.push_str(&failed.join("\n"));
    }
    prompt
}
