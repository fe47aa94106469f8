use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{error::agent_error::AgentError, tools::ToolSpec};

const REFERENCE_PREFIX: &str = "$step_";

/// JSON schema the planner asks the model to follow.
pub static PLAN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["steps"],
        "properties": {
            "task_analysis": {"type": "string"},
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["tool"],
                    "properties": {
                        "step_number": {"type": "integer"},
                        "description": {"type": "string"},
                        "tool": {"type": "string"},
                        "parameters": {"type": ["object", "null"]},
                        "depends_on": {"type": "array", "items": {"type": "integer"}}
                    }
                }
            }
        }
    })
});

/// A step argument: either a literal or the output of an earlier step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Argument {
    Literal {
        value: Value,
    },
    Reference {
        step: usize,
        /// Dotted path into the referenced output; the whole output when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub index: usize,
    pub description: String,
    pub tool_name: String,
    pub arguments: BTreeMap<String, Argument>,
    #[serde(default)]
    pub depends_on: Vec<usize>,
}

impl Step {
    /// Indices of every step this one reads from or waits on, ascending.
    pub fn prerequisites(&self) -> Vec<usize> {
        let mut indices: BTreeSet<usize> = self.depends_on.iter().copied().collect();
        for argument in self.arguments.values() {
            if let Argument::Reference { step, .. } = argument {
                indices.insert(*step);
            }
        }
        indices.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub task_analysis: String,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Rejects plans the executor could not run: no steps, tools outside
    /// `tools`, or references that do not point strictly backwards.
    pub fn validate(&self, tools: &[ToolSpec]) -> Result<(), AgentError> {
        if self.steps.is_empty() {
            return Err(AgentError::InvalidPlan("plan has no steps".to_string()));
        }
        for (position, step) in self.steps.iter().enumerate() {
            if step.index != position {
                return Err(AgentError::InvalidPlan(format!(
                    "step at position {} carries index {}",
                    position, step.index
                )));
            }
            if !tools.iter().any(|spec| spec.name == step.tool_name) {
                return Err(AgentError::InvalidPlan(format!(
                    "step {} uses unknown tool '{}'",
                    position + 1,
                    step.tool_name
                )));
            }
            if let Some(bad) = step.prerequisites().into_iter().find(|&i| i >= position) {
                return Err(AgentError::InvalidPlan(format!(
                    "step {} refers to step {}, which does not come before it",
                    position + 1,
                    bad + 1
                )));
            }
        }
        Ok(())
    }

    /// The plan in the shape the model produces, for re-planning prompts.
    pub fn to_wire(&self) -> RawPlan {
        RawPlan {
            task_analysis: self.task_analysis.clone(),
            steps: self
                .steps
                .iter()
                .map(|step| RawStep {
                    step_number: Some(step.index as u64 + 1),
                    description: step.description.clone(),
                    tool: step.tool_name.clone(),
                    parameters: Some(
                        step.arguments
                            .iter()
                            .map(|(name, argument)| (name.clone(), argument_to_wire(argument)))
                            .collect(),
                    ),
                    depends_on: step.depends_on.iter().map(|&i| i as u64 + 1).collect(),
                })
                .collect(),
        }
    }
}

/// Plan as the model writes it: 1-based step numbers and `$step_N` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlan {
    #[serde(default)]
    pub task_analysis: String,
    pub steps: Vec<RawStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub step_number: Option<u64>,
    #[serde(default)]
    pub description: String,
    pub tool: String,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub depends_on: Vec<u64>,
}

impl TryFrom<RawPlan> for Plan {
    type Error = AgentError;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let mut positions: HashMap<u64, usize> = HashMap::new();
        for (position, step) in raw.steps.iter().enumerate() {
            let number = step.step_number.unwrap_or(position as u64 + 1);
            if positions.insert(number, position).is_some() {
                return Err(AgentError::InvalidPlan(format!(
                    "step number {} appears more than once",
                    number
                )));
            }
        }
        let lookup = |number: u64| {
            positions.get(&number).copied().ok_or_else(|| {
                AgentError::InvalidPlan(format!("reference to unknown step {}", number))
            })
        };

        let mut steps = Vec::with_capacity(raw.steps.len());
        for (index, raw_step) in raw.steps.into_iter().enumerate() {
            let depends_on = raw_step
                .depends_on
                .iter()
                .map(|&number| lookup(number))
                .collect::<Result<Vec<_>, _>>()?;
            let mut arguments = BTreeMap::new();
            for (name, value) in raw_step.parameters.unwrap_or_default() {
                let argument = match parse_reference(&value)? {
                    Some((number, path)) => Argument::Reference {
                        step: lookup(number)?,
                        path,
                    },
                    None => Argument::Literal { value },
                };
                arguments.insert(name, argument);
            }
            steps.push(Step {
                index,
                description: raw_step.description,
                tool_name: raw_step.tool.trim().to_string(),
                arguments,
                depends_on,
            });
        }

        Ok(Plan {
            task_analysis: raw.task_analysis,
            steps,
        })
    }
}

/// `"$step_2"` -> `(2, None)`, `"$step_2.rates.EUR"` -> `(2, Some("rates.EUR"))`.
fn parse_reference(value: &Value) -> Result<Option<(u64, Option<String>)>, AgentError> {
    let Some(rest) = value.as_str().and_then(|s| s.trim().strip_prefix(REFERENCE_PREFIX)) else {
        return Ok(None);
    };
    let (number, path) = match rest.split_once('.') {
        Some((number, path)) => (number, Some(path)),
        None => (rest, None),
    };
    let number = number
        .parse::<u64>()
        .map_err(|_| AgentError::InvalidPlan(format!("malformed step reference '{}'", rest)))?;
    match path {
        Some(path) if path.is_empty() || path.split('.').any(str::is_empty) => Err(
            AgentError::InvalidPlan(format!("malformed step reference '{}'", rest)),
        ),
        path => Ok(Some((number, path.map(str::to_string)))),
    }
}

fn argument_to_wire(argument: &Argument) -> Value {
    match argument {
        Argument::Literal { value } => value.clone(),
        Argument::Reference { step, path: None } => json!(format!("{}{}", REFERENCE_PREFIX, step + 1)),
        Argument::Reference {
            step,
            path: Some(path),
        } => json!(format!("{}{}.{}", REFERENCE_PREFIX, step + 1, path)),
    }
}
