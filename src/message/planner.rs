use crate::{
    agent::planning::Plan,
    input::Task,
    message::Prompt,
    prompt::builder::{build_task_prompt, build_tools_prompt},
    tools::ToolSpec,
};

const PLAN_FORMAT: &str = r#"Output a JSON object with this structure:
{
  "task_analysis": "Brief analysis of what needs to be done",
  "steps": [
    {
      "step_number": 1,
      "description": "What this step does",
      "tool": "tool_name",
      "parameters": {"param1": "value1"},
      "depends_on": []
    }
  ]
}

To pass the output of an earlier step as a parameter, use the string "$step_N"
for the whole output of step N, or "$step_N.field.subfield" for a part of it
(array positions are numbers, e.g. "$step_1.repositories.0.name").
List such steps in "depends_on" as well.
Only output the JSON object. No notes, no explanations."#;

pub fn generate_planner_message(task: &Task, tools: &[ToolSpec]) -> Prompt {
    let system = format!(
        "You are a planning agent that breaks down tasks into executable steps.\n\
         Analyze the user's task and create a detailed execution plan.\n\n\
         Guidelines:\n\
         - Break complex tasks into simple, sequential steps\n\
         - Use exactly one tool per step\n\
         - Be specific about tool parameters\n\
         - A step may only use results of steps before it\n\n\
         {}",
        PLAN_FORMAT
    );
    let user = format!(
        "{}\n\n{}\n\nCreate a detailed execution plan for this task.",
        build_task_prompt(task),
        build_tools_prompt(tools)
    );
    Prompt { system, user }
}

pub fn generate_refinement_message(previous: &Plan, feedback: &str, tools: &[ToolSpec]) -> Prompt {
    let system = format!(
        "You are refining an execution plan based on feedback. \
         Keep successful steps and modify or add steps as needed.\n\n{}",
        PLAN_FORMAT
    );
    let original = serde_json::to_string_pretty(&previous.to_wire()).unwrap_or_default();
    let user = format!(
        "Original plan:\n{}\n\nFeedback: {}\n\n{}\n\nRefine the plan to address this feedback. Maintain the same JSON structure.",
        original,
        feedback,
        build_tools_prompt(tools)
    );
    Prompt { system, user }
}
