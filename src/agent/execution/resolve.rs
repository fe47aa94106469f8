use serde_json::{Map, Value};

use crate::{
    agent::{
        planning::{Argument, Step},
        types::{ExecutionLog, StepFailure},
    },
    error::tool_error::FailureKind,
};

/// Builds the concrete argument map for `step` from literals and earlier
/// outputs. Fails without touching the tool when a prerequisite failed or a
/// referenced field is missing.
pub fn resolve_arguments(step: &Step, log: &ExecutionLog) -> Result<Map<String, Value>, StepFailure> {
    for index in step.prerequisites() {
        match log.get(index) {
            Some(result) if result.is_ok() => {}
            _ => {
                return Err(StepFailure {
                    kind: FailureKind::Dependency,
                    message: format!("step {} did not succeed", index + 1),
                });
            }
        }
    }

    let mut resolved = Map::new();
    for (name, argument) in &step.arguments {
        let value = match argument {
            Argument::Literal { value } => value.clone(),
            Argument::Reference { step: index, path } => {
                // Prerequisites were checked above, so the result is present and ok.
                let output = log.get(*index).map(|r| &r.output).unwrap_or(&Value::Null);
                match path {
                    None => output.clone(),
                    Some(path) => lookup_path(output, path).cloned().ok_or_else(|| StepFailure {
                        kind: FailureKind::Validation,
                        message: format!(
                            "argument '{}': step {} output has no field '{}'",
                            name,
                            index + 1,
                            path
                        ),
                    })?,
                }
            }
        };
        resolved.insert(name.clone(), value);
    }
    Ok(resolved)
}

/// Walks a dotted path; numeric segments index into arrays.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
