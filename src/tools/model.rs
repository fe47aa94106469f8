use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::tool_error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

/// One declared input of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,

    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ParamSpec {
    fn new(param_type: ParamType, description: &str) -> Self {
        Self {
            param_type,
            description: description.to_string(),
            required: false,
            default: None,
            allowed: None,
        }
    }

    pub fn string(description: &str) -> Self {
        Self::new(ParamType::String, description)
    }

    pub fn integer(description: &str) -> Self {
        Self::new(ParamType::Integer, description)
    }

    pub fn number(description: &str) -> Self {
        Self::new(ParamType::Number, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Checks one supplied value, coercing the shapes models commonly emit
    /// (numeric strings, bare numbers where a string is expected).
    fn coerce(&self, name: &str, value: &Value) -> Result<Value, ToolError> {
        let mismatch = || {
            ToolError::Validation(format!(
                "parameter '{}' must be of type {:?}, got {}",
                name, self.param_type, value
            ))
        };

        let coerced = match (self.param_type, value) {
            (ParamType::String, Value::String(_)) => value.clone(),
            (ParamType::String, Value::Number(n)) => Value::String(n.to_string()),
            (ParamType::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => Value::from(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Value::from(f as i64),
                    _ => return Err(mismatch()),
                },
            },
            (ParamType::Integer, Value::String(s)) => {
                Value::from(s.trim().parse::<i64>().map_err(|_| mismatch())?)
            }
            (ParamType::Number, Value::Number(_)) => value.clone(),
            (ParamType::Number, Value::String(s)) => {
                let parsed = s.trim().parse::<f64>().map_err(|_| mismatch())?;
                serde_json::Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(mismatch)?
            }
            (ParamType::Boolean, Value::Bool(_)) => value.clone(),
            (ParamType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(mismatch()),
            },
            (ParamType::Object, Value::Object(_)) | (ParamType::Array, Value::Array(_)) => {
                value.clone()
            }
            _ => return Err(mismatch()),
        };

        if let (Some(allowed), Value::String(s)) = (&self.allowed, &coerced) {
            let wanted = s.to_lowercase();
            return match allowed.iter().find(|a| a.to_lowercase() == wanted) {
                Some(canonical) => Ok(Value::String(canonical.clone())),
                None => Err(ToolError::Validation(format!(
                    "parameter '{}' must be one of [{}], got '{}'",
                    name,
                    allowed.join(", "),
                    s
                ))),
            };
        }

        Ok(coerced)
    }
}

/// Name, description and input schema a tool advertises to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &str, spec: ParamSpec) -> Self {
        self.parameters.insert(name.to_string(), spec);
        self
    }

    /// Validates `params` against the declared schema and returns the
    /// normalized argument map: defaults filled in, values coerced, undeclared
    /// keys dropped. `null` counts as absent.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
        let mut normalized = Map::new();
        for (name, spec) in &self.parameters {
            match params.get(name).filter(|v| !v.is_null()) {
                Some(value) => {
                    normalized.insert(name.clone(), spec.coerce(name, value)?);
                }
                None if spec.required => {
                    return Err(ToolError::Validation(format!(
                        "missing required parameter '{}' for tool '{}'",
                        name, self.name
                    )));
                }
                None => {
                    if let Some(default) = &spec.default {
                        normalized.insert(name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(normalized)
    }
}

pub fn str_param<'a>(params: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn required_str<'a>(
    params: &'a Map<String, Value>,
    name: &str,
    context: &str,
) -> Result<&'a str, ToolError> {
    str_param(params, name).ok_or_else(|| {
        ToolError::Validation(format!("parameter '{}' is required for {}", name, context))
    })
}

pub fn u64_param(params: &Map<String, Value>, name: &str) -> Option<u64> {
    params.get(name).and_then(Value::as_i64).map(|v| v.max(0) as u64)
}

pub fn f64_param(params: &Map<String, Value>, name: &str) -> Option<f64> {
    params.get(name).and_then(Value::as_f64)
}

/// Reads a field out of an upstream payload; a missing field means the
/// upstream answered with something we cannot use.
pub fn field<'a>(value: &'a Value, pointer: &str) -> Result<&'a Value, ToolError> {
    value
        .pointer(pointer)
        .ok_or_else(|| ToolError::upstream(None, format!("response is missing '{}'", pointer)))
}

/// Numeric field that some upstreams encode as a string.
pub fn number_field(value: &Value, pointer: &str) -> Result<f64, ToolError> {
    let raw = field(value, pointer)?;
    raw.as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolError::upstream(None, format!("'{}' is not numeric: {}", pointer, raw)))
}
