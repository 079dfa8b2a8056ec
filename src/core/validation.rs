/// Declarative Parameter Validation
///
/// An `OperationSchema` is plain data: an ordered list of fields, each with a
/// `FieldRule` describing its JSON type, whether it is required, optional or
/// defaulted, and the checks its value must pass. One generic interpreter
/// (`OperationSchema::validate`) applies any schema to raw tool arguments and
/// either returns the normalized object or every violation it found.
///
/// The same data renders the JSON Schema advertised in `tools/list`.

use regex::Regex;
use serde_json::{Map, Number, Value, json};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::core::error::ConfigError;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::String, Value::String(_))
                | (FieldKind::Number, Value::Number(_))
                | (FieldKind::Boolean, Value::Bool(_))
        )
    }
}

/// How a field behaves when absent from the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    Default(Value),
}

/// A single constraint on a field's value, with the message reported when it
/// fails.
#[derive(Debug, Clone)]
pub enum Check {
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Pattern(Regex, &'static str),
    Integer(&'static str),
    Minimum(f64, &'static str),
    Maximum(f64, &'static str),
}

impl Check {
    /// Returns the failure message if `value` violates this check. The value
    /// has already been type-checked against the field kind.
    fn violation(&self, value: &Value) -> Option<&'static str> {
        let ok = match (self, value) {
            (Check::MinLength(min, _), Value::String(s)) => s.chars().count() >= *min,
            (Check::MaxLength(max, _), Value::String(s)) => s.chars().count() <= *max,
            (Check::Pattern(re, _), Value::String(s)) => re.is_match(s),
            (Check::Integer(_), Value::Number(n)) => is_integral(n),
            (Check::Minimum(min, _), Value::Number(n)) => n.as_f64().is_some_and(|v| v >= *min),
            (Check::Maximum(max, _), Value::Number(n)) => n.as_f64().is_some_and(|v| v <= *max),
            _ => true,
        };
        if ok { None } else { Some(self.message()) }
    }

    fn message(&self) -> &'static str {
        match self {
            Check::MinLength(_, m)
            | Check::MaxLength(_, m)
            | Check::Pattern(_, m)
            | Check::Integer(m)
            | Check::Minimum(_, m)
            | Check::Maximum(_, m) => m,
        }
    }
}

/// Rule-set for one parameter.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub kind: FieldKind,
    pub presence: Presence,
    pub checks: Vec<Check>,
    pub description: &'static str,
}

impl FieldRule {
    fn new(kind: FieldKind, description: &'static str) -> Self {
        Self {
            kind,
            presence: Presence::Required,
            checks: Vec::new(),
            description,
        }
    }

    pub fn string(description: &'static str) -> Self {
        Self::new(FieldKind::String, description)
    }

    pub fn number(description: &'static str) -> Self {
        Self::new(FieldKind::Number, description)
    }

    pub fn boolean(description: &'static str) -> Self {
        Self::new(FieldKind::Boolean, description)
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.presence = Presence::Default(value);
        self
    }

    pub fn min_len(mut self, min: usize, message: &'static str) -> Self {
        self.checks.push(Check::MinLength(min, message));
        self
    }

    pub fn max_len(mut self, max: usize, message: &'static str) -> Self {
        self.checks.push(Check::MaxLength(max, message));
        self
    }

    pub fn integer(mut self, message: &'static str) -> Self {
        self.checks.push(Check::Integer(message));
        self
    }

    pub fn min(mut self, min: f64, message: &'static str) -> Self {
        self.checks.push(Check::Minimum(min, message));
        self
    }

    pub fn max(mut self, max: f64, message: &'static str) -> Self {
        self.checks.push(Check::Maximum(max, message));
        self
    }

    /// Adds a regular-expression constraint. The pattern is compiled here so a
    /// bad pattern surfaces as a startup error.
    pub fn pattern(mut self, source: &str, message: &'static str) -> Result<Self, ConfigError> {
        let re = Regex::new(source).map_err(|e| ConfigError::Schema {
            field: self.description.to_string(),
            reason: e.to_string(),
        })?;
        self.checks.push(Check::Pattern(re, message));
        Ok(self)
    }

    fn is_integer(&self) -> bool {
        self.checks.iter().any(|c| matches!(c, Check::Integer(_)))
    }

    /// Type-checks and runs every check, collecting all failure messages.
    fn evaluate(&self, value: &Value) -> Result<Value, Vec<String>> {
        if !self.kind.accepts(value) {
            return Err(vec![format!(
                "Expected {}, received {}",
                self.kind.name(),
                json_type_name(value)
            )]);
        }

        let failures: Vec<String> = self
            .checks
            .iter()
            .filter_map(|check| check.violation(value))
            .map(str::to_string)
            .collect();
        if !failures.is_empty() {
            return Err(failures);
        }

        Ok(self.normalize(value))
    }

    /// Integral numbers on integer fields are rewritten as JSON integers so
    /// that `50.0` and `50` normalize identically.
    fn normalize(&self, value: &Value) -> Value {
        if let Value::Number(n) = value {
            if self.is_integer() && n.is_f64() {
                if let Some(i) = n.as_f64().map(|f| f as i64) {
                    return Value::Number(Number::from(i));
                }
            }
        }
        value.clone()
    }

    fn json_schema(&self) -> Value {
        let mut schema = Map::new();
        let type_name = if self.is_integer() { "integer" } else { self.kind.name() };
        schema.insert("type".into(), json!(type_name));
        for check in &self.checks {
            match check {
                Check::MinLength(n, _) => {
                    schema.insert("minLength".into(), json!(n));
                }
                Check::MaxLength(n, _) => {
                    schema.insert("maxLength".into(), json!(n));
                }
                Check::Pattern(re, _) => {
                    schema.insert("pattern".into(), json!(re.as_str()));
                }
                Check::Minimum(n, _) => {
                    schema.insert("minimum".into(), json!(n));
                }
                Check::Maximum(n, _) => {
                    schema.insert("maximum".into(), json!(n));
                }
                Check::Integer(_) => {}
            }
        }
        if let Presence::Default(v) = &self.presence {
            schema.insert("default".into(), v.clone());
        }
        schema.insert("description".into(), json!(self.description));
        Value::Object(schema)
    }
}

/// One violated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path to the field; empty when the input as a whole is wrong.
    pub path: String,
    pub message: String,
}

/// Every violation found while validating one input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.path, issue.message)
                }
            })
            .collect();
        write!(f, "validation failed: {}", parts.join("; "))
    }
}

/// Ordered, immutable rule-set for one operation.
#[derive(Debug, Clone)]
pub struct OperationSchema {
    fields: Vec<(&'static str, FieldRule)>,
}

impl OperationSchema {
    /// Builds a schema, rejecting duplicate field names and defaults that
    /// would not pass their own rule.
    pub fn new(fields: Vec<(&'static str, FieldRule)>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for (name, rule) in &fields {
            if !seen.insert(*name) {
                return Err(ConfigError::Schema {
                    field: name.to_string(),
                    reason: "declared more than once".into(),
                });
            }
            if let Presence::Default(value) = &rule.presence {
                if let Err(failures) = rule.evaluate(value) {
                    return Err(ConfigError::Schema {
                        field: name.to_string(),
                        reason: format!("default value is invalid: {}", failures.join(", ")),
                    });
                }
            }
        }
        Ok(Self { fields })
    }

    /// Concatenates two schemas, e.g. an operation's own fields plus the shared
    /// pagination fields.
    pub fn extend(self, other: OperationSchema) -> Result<Self, ConfigError> {
        let mut fields = self.fields;
        fields.extend(other.fields);
        Self::new(fields)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (*name, rule))
    }

    /// Validates raw arguments. `null` is treated as an empty object. Unknown
    /// keys are dropped and defaults are filled in.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, ValidationError> {
        let empty = Map::new();
        let object = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ValidationError {
                    issues: vec![FieldIssue {
                        path: String::new(),
                        message: format!("Expected object, received {}", json_type_name(other)),
                    }],
                });
            }
        };

        let mut output = Map::new();
        let mut issues = Vec::new();
        for (name, rule) in &self.fields {
            match (object.get(*name), &rule.presence) {
                (None, Presence::Required) => issues.push(FieldIssue {
                    path: name.to_string(),
                    message: "Required".into(),
                }),
                (None, Presence::Optional) => {}
                (None, Presence::Default(value)) => {
                    output.insert(name.to_string(), value.clone());
                }
                (Some(value), _) => match rule.evaluate(value) {
                    Ok(normalized) => {
                        output.insert(name.to_string(), normalized);
                    }
                    Err(failures) => issues.extend(failures.into_iter().map(|message| FieldIssue {
                        path: name.to_string(),
                        message,
                    })),
                },
            }
        }

        if issues.is_empty() {
            Ok(output)
        } else {
            Err(ValidationError { issues })
        }
    }

    /// JSON Schema (draft-07) describing the accepted input object.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, rule)| (name.to_string(), rule.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, rule)| rule.presence == Presence::Required)
            .map(|(name, _)| *name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
            "$schema": "http://json-schema.org/draft-07/schema#"
        })
    }
}

fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
