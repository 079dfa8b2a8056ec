/// Operation Schemas
///
/// Rule-sets for every Jules operation exposed as a tool. Each function builds
/// a fresh `OperationSchema`; they are called once at startup when the tool
/// registry is assembled, so a malformed pattern stops the process before it
/// serves anything.

use serde_json::json;

use crate::core::error::ConfigError;
use crate::core::validation::{FieldRule, OperationSchema};

pub const SOURCE_PATTERN: &str = r"^sources/github/[A-Za-z0-9_-]+/[A-Za-z0-9_.-]+$";
pub const BRANCH_PATTERN: &str = r"^[A-Za-z0-9_./-]+$";
pub const SESSION_ID_PATTERN: &str = r"^sessions/[A-Za-z0-9_-]+$";
/// A bare session id, as captured from a resource URI.
pub const SESSION_SEGMENT_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

pub const DEFAULT_BRANCH: &str = "main";

/// Shared `pageSize` / `pageToken` fields.
pub fn pagination() -> Result<OperationSchema, ConfigError> {
    OperationSchema::new(vec![
        (
            "pageSize",
            FieldRule::number("Number of items per page (max 100)")
                .integer("Page size must be an integer")
                .min(1.0, "Page size must be at least 1")
                .max(100.0, "Page size cannot exceed 100")
                .optional(),
        ),
        (
            "pageToken",
            FieldRule::string("Token for pagination")
                .min_len(1, "Page token cannot be empty")
                .optional(),
        ),
    ])
}

fn session_id(description: &'static str) -> Result<FieldRule, ConfigError> {
    FieldRule::string(description)
        .min_len(1, "Session ID cannot be empty")
        .pattern(
            SESSION_ID_PATTERN,
            "Invalid session ID format. Expected: sessions/{id}",
        )
}

/// GET /v1alpha/sources
pub fn list_sources() -> Result<OperationSchema, ConfigError> {
    pagination()
}

/// GET /v1alpha/sessions
pub fn list_sessions() -> Result<OperationSchema, ConfigError> {
    pagination()
}

/// POST /v1alpha/sessions
pub fn create_session() -> Result<OperationSchema, ConfigError> {
    OperationSchema::new(vec![
        (
            "prompt",
            FieldRule::string("The task prompt for Jules")
                .min_len(1, "Prompt cannot be empty")
                .max_len(10000, "Prompt is too long (max 10000 characters)"),
        ),
        (
            "source",
            FieldRule::string("Source path, e.g., \"sources/github/owner/repo\"").pattern(
                SOURCE_PATTERN,
                "Invalid source format. Expected: sources/github/owner/repo",
            )?,
        ),
        (
            "title",
            FieldRule::string("Optional session title")
                .min_len(1, "Title cannot be empty")
                .max_len(200, "Title is too long (max 200 characters)")
                .optional(),
        ),
        (
            "startingBranch",
            FieldRule::string("Git branch to start from (default: main)")
                .min_len(1, "Branch name cannot be empty")
                .max_len(255, "Branch name is too long")
                .pattern(
                    BRANCH_PATTERN,
                    "Invalid branch name. Use only alphanumeric characters, dots, dashes, and slashes",
                )?
                .default_value(json!(DEFAULT_BRANCH)),
        ),
        (
            "requirePlanApproval",
            FieldRule::boolean("Whether to require plan approval before execution")
                .default_value(json!(false)),
        ),
    ])
}

/// POST /v1alpha/sessions/{id}:approvePlan
pub fn approve_plan() -> Result<OperationSchema, ConfigError> {
    OperationSchema::new(vec![(
        "sessionId",
        session_id("The session ID to approve the plan for")?,
    )])
}

/// POST /v1alpha/sessions/{id}:sendMessage
pub fn send_message() -> Result<OperationSchema, ConfigError> {
    OperationSchema::new(vec![
        ("sessionId", session_id("The session ID to send the message to")?),
        (
            "prompt",
            FieldRule::string("The message to send to the agent")
                .min_len(1, "Message cannot be empty")
                .max_len(10000, "Message is too long (max 10000 characters)"),
        ),
    ])
}

/// GET /v1alpha/sessions/{id}/activities
pub fn list_activities() -> Result<OperationSchema, ConfigError> {
    OperationSchema::new(vec![(
        "sessionId",
        session_id("The session ID to list activities for")?,
    )])?
    .extend(pagination()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn messages(
        result: Result<serde_json::Map<String, Value>, crate::core::error::ValidationError>,
    ) -> Vec<(String, String)> {
        result
            .unwrap_err()
            .issues
            .into_iter()
            .map(|i| (i.path, i.message))
            .collect()
    }

    #[test]
    fn pagination_accepts_bounds_and_returns_input_unchanged() {
        let schema = pagination().unwrap();
        for size in [1, 50, 100] {
            let input = json!({"pageSize": size, "pageToken": "abc123"});
            let out = schema.validate(&input).unwrap();
            assert_eq!(Value::Object(out), input);
        }
    }

    #[test]
    fn pagination_rejects_out_of_range_and_fractional_sizes() {
        let schema = pagination().unwrap();
        assert_eq!(
            messages(schema.validate(&json!({"pageSize": 150}))),
            vec![("pageSize".into(), "Page size cannot exceed 100".into())]
        );
        assert_eq!(
            messages(schema.validate(&json!({"pageSize": 0}))),
            vec![("pageSize".into(), "Page size must be at least 1".into())]
        );
        assert_eq!(
            messages(schema.validate(&json!({"pageSize": 2.5}))),
            vec![("pageSize".into(), "Page size must be an integer".into())]
        );
        assert_eq!(
            messages(schema.validate(&json!({"pageSize": "10"}))),
            vec![("pageSize".into(), "Expected number, received string".into())]
        );
    }

    #[test]
    fn pagination_rejects_empty_token() {
        assert_eq!(
            messages(pagination().unwrap().validate(&json!({"pageToken": ""}))),
            vec![("pageToken".into(), "Page token cannot be empty".into())]
        );
    }

    #[test]
    fn create_session_applies_defaults() {
        let out = create_session()
            .unwrap()
            .validate(&json!({
                "prompt": "Add authentication to the API",
                "source": "sources/github/myorg/my.repo"
            }))
            .unwrap();
        assert_eq!(out["startingBranch"], json!("main"));
        assert_eq!(out["requirePlanApproval"], json!(false));
        assert!(!out.contains_key("title"));
    }

    #[test]
    fn create_session_keeps_explicit_values() {
        let out = create_session()
            .unwrap()
            .validate(&json!({
                "prompt": "Fix the bug",
                "source": "sources/github/org/repo",
                "title": "Auth Feature",
                "startingBranch": "feature/auth-v2.1",
                "requirePlanApproval": true
            }))
            .unwrap();
        assert_eq!(out["startingBranch"], json!("feature/auth-v2.1"));
        assert_eq!(out["requirePlanApproval"], json!(true));
        assert_eq!(out["title"], json!("Auth Feature"));
    }

    #[test]
    fn create_session_prompt_bounds() {
        let schema = create_session().unwrap();
        let source = "sources/github/org/repo";
        assert_eq!(
            messages(schema.validate(&json!({"prompt": "", "source": source}))),
            vec![("prompt".into(), "Prompt cannot be empty".into())]
        );
        let long = "x".repeat(10001);
        assert_eq!(
            messages(schema.validate(&json!({"prompt": long, "source": source}))),
            vec![("prompt".into(), "Prompt is too long (max 10000 characters)".into())]
        );
        let max = "x".repeat(10000);
        assert!(schema.validate(&json!({"prompt": max, "source": source})).is_ok());
    }

    #[test]
    fn create_session_rejects_malformed_source() {
        let schema = create_session().unwrap();
        for source in [
            "github/org/repo",
            "sources/gitlab/org/repo",
            "sources/github/org",
            "sources/github/o rg/repo",
        ] {
            assert_eq!(
                messages(schema.validate(&json!({"prompt": "p", "source": source}))),
                vec![(
                    "source".into(),
                    "Invalid source format. Expected: sources/github/owner/repo".into()
                )],
                "source {source} should be rejected"
            );
        }
    }

    #[test]
    fn create_session_rejects_bad_branch_names() {
        let err = messages(create_session().unwrap().validate(&json!({
            "prompt": "p",
            "source": "sources/github/org/repo",
            "startingBranch": "bad branch!"
        })));
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].0, "startingBranch");
        assert!(err[0].1.starts_with("Invalid branch name"));
    }

    #[test]
    fn create_session_reports_all_violations_at_once() {
        let err = messages(create_session().unwrap().validate(&json!({
            "prompt": "",
            "source": "not-a-source",
            "title": "t".repeat(201)
        })));
        let paths: Vec<_> = err.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["prompt", "source", "title"]);
    }

    #[test]
    fn create_session_validation_is_idempotent() {
        let schema = create_session().unwrap();
        let first = schema
            .validate(&json!({"prompt": "p", "source": "sources/github/a/b"}))
            .unwrap();
        let second = schema.validate(&Value::Object(first.clone())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn session_id_pattern_applies_to_every_session_operation() {
        let cases = [
            approve_plan().unwrap(),
            send_message().unwrap(),
            list_activities().unwrap(),
        ];
        for schema in &cases {
            let bad = schema.validate(&json!({"sessionId": "abc123", "prompt": "hi"}));
            assert_eq!(
                messages(bad),
                vec![(
                    "sessionId".into(),
                    "Invalid session ID format. Expected: sessions/{id}".into()
                )]
            );
            assert!(schema
                .validate(&json!({"sessionId": "sessions/abc-123_x", "prompt": "hi"}))
                .is_ok());
        }
    }

    #[test]
    fn empty_session_id_fails_both_checks() {
        let err = messages(approve_plan().unwrap().validate(&json!({"sessionId": ""})));
        assert_eq!(err.len(), 2);
        assert_eq!(err[0].1, "Session ID cannot be empty");
    }

    #[test]
    fn list_activities_includes_pagination() {
        let schema = list_activities().unwrap();
        let names: Vec<_> = schema.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["sessionId", "pageSize", "pageToken"]);
        assert!(schema
            .validate(&json!({"sessionId": "sessions/1", "pageSize": 101}))
            .is_err());
    }

    #[test]
    fn send_message_requires_prompt() {
        assert_eq!(
            messages(send_message().unwrap().validate(&json!({"sessionId": "sessions/1"}))),
            vec![("prompt".into(), "Required".into())]
        );
    }
}
