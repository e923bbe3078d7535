//! Argument validation against a tool's advertised input schema.
//!
//! Runs before any handler so a malformed call never reaches a vendor.

use crate::jsonrpc::RpcError;
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Violation {
    #[serde(rename_all = "camelCase")]
    InvalidParameter {
        parameter: String,
        suggestions: Vec<String>,
        valid_parameters: Vec<String>,
    },
    MissingRequiredParameter { parameter: String },
    #[serde(rename_all = "camelCase")]
    ConstraintViolation {
        message: String,
        instance_path: String,
    },
}

/// Check `args` against the top-level `properties`/`required` of `schema`, then run full
/// JSON Schema validation for nested constraints.
///
/// # Errors
///
/// Returns an invalid-params error whose `data` lists every violation.
pub fn validate_arguments(schema: &Map<String, Value>, args: &Map<String, Value>) -> Result<(), RpcError> {
    let empty = Map::new();
    let props = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let valid: Vec<&str> = props.keys().map(String::as_str).collect();

    let mut violations = Vec::new();
    for key in args.keys().filter(|k| !props.contains_key(*k)) {
        violations.push(Violation::InvalidParameter {
            parameter: key.clone(),
            suggestions: similar(key, &valid),
            valid_parameters: valid.iter().map(|s| (*s).to_string()).collect(),
        });
    }

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required.filter(|r| !args.contains_key(*r)) {
        violations.push(Violation::MissingRequiredParameter {
            parameter: name.to_string(),
        });
    }

    let schema_value = Value::Object(schema.clone());
    let instance = Value::Object(args.clone());
    match jsonschema::validator_for(&schema_value) {
        Ok(validator) => {
            for e in validator.iter_errors(&instance) {
                // Reported above with a friendlier shape.
                if matches!(
                    e.kind(),
                    jsonschema::error::ValidationErrorKind::Required { .. }
                        | jsonschema::error::ValidationErrorKind::AdditionalProperties { .. }
                ) && e.instance_path().to_string().is_empty()
                {
                    continue;
                }
                violations.push(Violation::ConstraintViolation {
                    message: e.to_string(),
                    instance_path: e.instance_path().to_string(),
                });
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "tool input schema does not compile");
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    let message = summarize(&violations);
    Err(RpcError::invalid_params(message).with_data(json!({
        "type": "validation-errors",
        "violations": violations,
    })))
}

fn summarize(violations: &[Violation]) -> String {
    let typo = violations.iter().find_map(|v| match v {
        Violation::InvalidParameter {
            parameter,
            suggestions,
            ..
        } => Some((parameter, suggestions.first())),
        _ => None,
    });
    match typo {
        Some((p, Some(s))) => format!("Invalid params: unknown parameter '{p}' (did you mean '{s}'?)"),
        Some((p, None)) => format!("Invalid params: unknown parameter '{p}'"),
        None => match violations {
            [Violation::MissingRequiredParameter { parameter }] => {
                format!("Invalid params: missing required parameter '{parameter}'")
            }
            [Violation::ConstraintViolation { message, .. }] => format!("Invalid params: {message}"),
            _ => format!(
                "Invalid params: validation failed with {} error(s)",
                violations.len()
            ),
        },
    }
}

fn similar(unknown: &str, known: &[&str]) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = known
        .iter()
        .map(|k| (strsim::jaro(unknown, k), *k))
        .filter(|(score, _)| *score > 0.7)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, s)| s.to_string()).collect()
}
