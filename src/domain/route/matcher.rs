//! Path pattern matching
//!
//! Patterns and paths are split on `/` and compared segment by segment.
//! Segment counts must be equal; a pattern segment starting with `:`
//! matches any single segment, every other segment must match exactly.

use std::collections::HashMap;

const PARAM_PREFIX: char = ':';

fn is_param(segment: &str) -> bool {
    segment.starts_with(PARAM_PREFIX)
}

/// True if `path` matches `pattern`
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    if pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(path_segments.iter())
        .all(|(p, s)| is_param(p) || p == s)
}

/// True if some concrete path would match both patterns
pub fn patterns_overlap(a: &str, b: &str) -> bool {
    let a_segments: Vec<&str> = a.split('/').collect();
    let b_segments: Vec<&str> = b.split('/').collect();

    if a_segments.len() != b_segments.len() {
        return false;
    }

    a_segments
        .iter()
        .zip(b_segments.iter())
        .all(|(x, y)| is_param(x) || is_param(y) || x == y)
}

/// Extract `:param` values from a matching path
pub fn extract_params(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    if !path_matches(pattern, path) {
        return None;
    }

    let params = pattern
        .split('/')
        .zip(path.split('/'))
        .filter(|(p, _)| is_param(p))
        .map(|(p, s)| (p[1..].to_string(), s.to_string()))
        .collect();

    Some(params)
}

/// Replace `:param` segments of `template` with values from `params`
pub fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    template
        .split('/')
        .map(|segment| {
            if is_param(segment) {
                params
                    .get(&segment[1..])
                    .map(String::as_str)
                    .unwrap_or(segment)
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(path_matches("/api/test", "/api/test"));
        assert!(!path_matches("/api/test", "/api/other"));
    }

    #[test]
    fn test_param_segment_matches_anything() {
        assert!(path_matches("/users/:id", "/users/42"));
        assert!(path_matches("/users/:id/orders/:order", "/users/7/orders/abc"));
        assert!(!path_matches("/users/:id/orders", "/users/7/invoices"));
    }

    #[test]
    fn test_segment_count_must_match() {
        assert!(!path_matches("/users/:id", "/users"));
        assert!(!path_matches("/users/:id", "/users/1/extra"));
        assert!(!path_matches("/api/test", "/api/test/"));
    }

    #[test]
    fn test_patterns_overlap() {
        assert!(patterns_overlap("/users/:id", "/users/me"));
        assert!(patterns_overlap("/users/me", "/users/:id"));
        assert!(patterns_overlap("/users/:id", "/users/:name"));
        assert!(!patterns_overlap("/users/me", "/users/you"));
        assert!(!patterns_overlap("/users/:id", "/users/:id/orders"));
    }

    #[test]
    fn test_extract_params() {
        let params = extract_params("/users/:id/orders/:order", "/users/7/orders/abc").unwrap();
        assert_eq!(params.get("id"), Some(&"7".to_string()));
        assert_eq!(params.get("order"), Some(&"abc".to_string()));

        assert!(extract_params("/users/:id", "/teams/7").is_none());
    }

    #[test]
    fn test_substitute_params() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());

        assert_eq!(substitute_params("/v2/users/:id", &params), "/v2/users/42");
        assert_eq!(substitute_params("/v2/:missing", &params), "/v2/:missing");
    }
}
