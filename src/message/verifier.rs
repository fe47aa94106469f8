use crate::{
    agent::{
        planning::Plan,
        types::{ExecutionLog, OverallStatus},
    },
    input::Task,
    message::Prompt,
    prompt::builder::{build_results_prompt, build_task_prompt},
};

const SYSTEM: &str = r#"You are synthesizing execution results into a natural, helpful answer.

Guidelines:
- Be concise and clear
- Focus on the most important information
- Use natural language, not technical jargon
- If some data could not be obtained, say so plainly

Output a JSON object:
{
  "final_answer": "the answer to the user's task",
  "needs_retry": false,
  "notes": "optional remarks about missing or doubtful data"
}
Set "needs_retry" to true only if running the task again could fill in missing data."#;

pub fn generate_verifier_message(
    task: &Task,
    plan: &Plan,
    log: &ExecutionLog,
    status: OverallStatus,
) -> Prompt {
    let completeness = match status {
        OverallStatus::Success => "All steps completed successfully",
        OverallStatus::Partial => "Some steps failed; answer with what is available",
        OverallStatus::Error => "No step succeeded",
    };
    let user = format!(
        "{}\n\nPlan analysis: {}\n\n{}\n\nCompleteness: {}\n\nGenerate a natural language answer that addresses the user's task.",
        build_task_prompt(task),
        plan.task_analysis,
        build_results_prompt(plan, log),
        completeness
    );
    Prompt {
        system: SYSTEM.to_string(),
        user,
    }
}
