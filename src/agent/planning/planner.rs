use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    agent::planning::plan::{PLAN_SCHEMA, Plan, RawPlan},
    error::agent_error::AgentError,
    input::Task,
    llm::{LanguageModel, ReasoningClient},
    message::{
        Prompt,
        planner::{generate_planner_message, generate_refinement_message},
    },
    tools::ToolSpec,
};

pub const PLANNING_TEMPERATURE: f32 = 0.3;

/// Turns a task into a validated [`Plan`]. No retries at this layer; the
/// reasoning client's repair pass is the only second chance.
pub struct Planner<M> {
    llm: Arc<ReasoningClient<M>>,
}

impl<M: LanguageModel> Planner<M> {
    pub fn new(llm: Arc<ReasoningClient<M>>) -> Self {
        Self { llm }
    }

    pub async fn plan(&self, task: &Task, tools: &[ToolSpec]) -> Result<Plan, AgentError> {
        info!(tools = tools.len(), "planning task");
        let plan = self.request(generate_planner_message(task, tools), tools).await?;
        info!(steps = plan.len(), "plan created");
        Ok(plan)
    }

    pub async fn refine(
        &self,
        previous: &Plan,
        feedback: &str,
        tools: &[ToolSpec],
    ) -> Result<Plan, AgentError> {
        info!(previous_steps = previous.len(), "refining plan");
        let plan = self
            .request(generate_refinement_message(previous, feedback, tools), tools)
            .await?;
        info!(steps = plan.len(), "refined plan created");
        Ok(plan)
    }

    async fn request(&self, prompt: Prompt, tools: &[ToolSpec]) -> Result<Plan, AgentError> {
        debug!(prompt = %prompt.user, "planner prompt");
        let raw: RawPlan = self
            .llm
            .generate_structured(
                &prompt.user,
                Some(&prompt.system),
                &PLAN_SCHEMA,
                PLANNING_TEMPERATURE,
            )
            .await?;
        let plan = Plan::try_from(raw)?;
        if let Err(err) = plan.validate(tools) {
            warn!(error = %err, "model produced an unusable plan");
            return Err(err);
        }
        Ok(plan)
    }
}
