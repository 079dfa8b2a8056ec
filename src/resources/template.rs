/// URI Templates
///
/// Minimal `scheme://a/{b}/c` matcher. A placeholder captures exactly one
/// non-empty path segment; everything else must match literally. Query strings
/// and fragments on the concrete URI are ignored.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::core::error::ConfigError;

pub type PathParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    scheme: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Template {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = template
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty() {
            return Err(invalid("missing scheme"));
        }

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        for part in rest.split('/') {
            if part.is_empty() {
                return Err(invalid("empty path segment"));
            }
            let opens = part.matches('{').count();
            let closes = part.matches('}').count();
            if opens == 0 && closes == 0 {
                segments.push(Segment::Literal(part.to_string()));
                continue;
            }
            let name = part
                .strip_prefix('{')
                .and_then(|p| p.strip_suffix('}'))
                .filter(|name| opens == 1 && closes == 1 && !name.is_empty())
                .ok_or_else(|| invalid("placeholders must span a whole segment, e.g. {id}"))?;
            if !names.insert(name.to_string()) {
                return Err(invalid("duplicate placeholder"));
            }
            segments.push(Segment::Param(name.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            scheme: scheme.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the template has no placeholders, i.e. names a single URI.
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Matches a concrete URI, returning the captured placeholders.
    pub fn match_uri(&self, uri: &str) -> Option<PathParams> {
        let uri = uri.split(['?', '#']).next().unwrap_or_default();
        let (scheme, rest) = uri.split_once("://")?;
        if scheme != self.scheme {
            return None;
        }

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_placeholder_segment() {
        let t = UriTemplate::parse("jules://sessions/{id}/activities").unwrap();
        let params = t.match_uri("jules://sessions/abc123/activities").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("abc123"));
        assert!(!t.is_static());
    }

    #[test]
    fn rejects_structural_mismatches() {
        let t = UriTemplate::parse("jules://sessions/{id}/activities").unwrap();
        assert!(t.match_uri("jules://sessions/abc123").is_none());
        assert!(t.match_uri("jules://sessions/abc123/activities/extra").is_none());
        assert!(t.match_uri("jules://sessions//activities").is_none());
        assert!(t.match_uri("jules://sessions/a/b/activities").is_none());
        assert!(t.match_uri("other://sessions/abc/activities").is_none());
        assert!(t.match_uri("sessions/abc/activities").is_none());
    }

    #[test]
    fn ignores_query_and_fragment() {
        let t = UriTemplate::parse("jules://sessions/{id}/activities").unwrap();
        let params = t.match_uri("jules://sessions/s1/activities?pageSize=5#top").unwrap();
        assert_eq!(params["id"], "s1");
    }

    #[test]
    fn static_templates_match_exactly() {
        let t = UriTemplate::parse("jules://sources").unwrap();
        assert!(t.is_static());
        assert_eq!(t.match_uri("jules://sources"), Some(PathParams::new()));
        assert!(t.match_uri("jules://sources/x").is_none());
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in [
            "no-scheme/{id}",
            "://x",
            "jules://a//b",
            "jules://a/{}/b",
            "jules://a/{id/b",
            "jules://a/x{id}/b",
            "jules://a/{id}/{id}",
        ] {
            assert!(UriTemplate::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
