mod support;

use std::sync::Arc;

use opsagent::{Task, agent::Planner, llm::ReasoningClient};
use serde_json::json;

use support::*;

#[tokio::test]
async fn null_parameters_are_accepted_without_repair() {
    let transport = Arc::new(ScriptedTransport::new());
    let tools = registry(&transport).list();
    let model = Arc::new(ScriptedModel::new(vec![reply(json!({
        "task_analysis": "Headlines only",
        "steps": [{"step_number": 1, "description": "Latest news", "tool": "news", "parameters": null}]
    }))]));
    let planner = Planner::new(Arc::new(ReasoningClient::new(model.clone())));

    let plan = planner
        .plan(&Task::new("What is in the news today?").unwrap(), &tools)
        .await
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.steps[0].tool_name, "news");
    assert!(plan.steps[0].arguments.is_empty());
    assert_eq!(model.requests().len(), 1);
}
