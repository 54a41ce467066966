//! Argument decoding and coercion shared by the task tools

use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::model::TaskStatus;

/// Decode the raw text payload of a tool invocation request.
///
/// Models sometimes send an empty payload for tools without required
/// parameters; that decodes to an empty object.
pub fn decode_arguments(raw: &str) -> Result<Value, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| ToolError::Decode(e.to_string()))?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        other => Err(ToolError::Decode(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field<'a>(args: &'a Value, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

/// Optional string field; `null` counts as absent
pub fn optional_str(args: &Value, key: &str) -> Result<Option<String>, ToolError> {
    match field(args, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::InvalidParams(format!(
            "{} must be a string, got {}",
            key,
            kind(other)
        ))),
    }
}

/// Required string field that must contain non-whitespace text
pub fn required_text(args: &Value, key: &str) -> Result<String, ToolError> {
    match optional_str(args, key)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(ToolError::InvalidParams(format!("{} must not be empty", key))),
        None => Err(ToolError::InvalidParams(format!("{} is required", key))),
    }
}

/// Optional `status` enum field
pub fn optional_status(args: &Value, key: &str) -> Result<Option<TaskStatus>, ToolError> {
    optional_str(args, key)?
        .map(|s| s.parse::<TaskStatus>().map_err(ToolError::InvalidParams))
        .transpose()
}

/// Required task id: a non-negative integer. Integral floats and
/// digit-only strings are coerced; anything outside the `i64` range is rejected.
pub fn task_id(args: &Value) -> Result<i64, ToolError> {
    const KEY: &str = "task_id";
    let invalid = |got: String| {
        ToolError::InvalidParams(format!("{} must be a non-negative integer, got {}", KEY, got))
    };

    match field(args, KEY) {
        None => Err(ToolError::InvalidParams(format!("{} is required", KEY))),
        Some(Value::Number(n)) => {
            if let Some(id) = n.as_i64() {
                return if id >= 0 { Ok(id) } else { Err(invalid(n.to_string())) };
            }
            // i64::MAX rounds up to 2^63 as f64, so the bound is exclusive.
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= 0.0 && f < i64::MAX as f64 => Ok(f as i64),
                _ => Err(invalid(n.to_string())),
            }
        }
        Some(Value::String(s)) => {
            let digits = s.trim();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                digits.parse::<i64>().map_err(|_| invalid(format!("\"{}\"", s)))
            } else {
                Err(invalid(format!("\"{}\"", s)))
            }
        }
        Some(other) => Err(invalid(kind(other).to_string())),
    }
}
