//! Public/protected path classification.
//!
//! One canonical rule set; the mount prefix is stripped by normalization
//! before matching, so `basePath + rule` and `rule` always classify the
//! same. Duplicated with/without-prefix rule lists are exactly the bug
//! class this module exists to remove.

use crate::config::RoutingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// A single path rule: exact, or prefix-wildcard (written `"/x/*"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    Exact(String),
    Prefix(String),
}

impl PathRule {
    /// Parse a configured rule string. `"/x/*"` becomes a prefix rule on
    /// `/x`; anything else is exact. Trailing slashes are stripped so rules
    /// are stored normalized.
    pub fn parse(rule: &str) -> Self {
        if let Some(prefix) = rule.strip_suffix("/*") {
            PathRule::Prefix(strip_trailing_slash(prefix).to_string())
        } else {
            PathRule::Exact(strip_trailing_slash(rule).to_string())
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(rule) => path == rule,
            // A prefix rule matches the bare prefix and anything below it,
            // but never a sibling that merely shares leading characters.
            PathRule::Prefix(prefix) => {
                path == prefix || path.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathPolicy {
    rules: Vec<PathRule>,
    base_path: Option<String>,
}

impl PathPolicy {
    pub fn new(rules: Vec<PathRule>, base_path: Option<String>) -> Self {
        Self {
            rules,
            base_path: base_path.map(|b| strip_trailing_slash(&b).to_string()),
        }
    }

    pub fn from_config(routing: &RoutingConfig) -> Self {
        Self::new(
            routing
                .public_paths
                .iter()
                .map(|rule| PathRule::parse(rule))
                .collect(),
            routing.base_path.clone(),
        )
    }

    /// Classify a request path. Pure; normalization happens here and only
    /// here.
    pub fn classify(&self, path: &str) -> Access {
        let normalized = self.normalize(path);
        if self.rules.iter().any(|rule| rule.matches(&normalized)) {
            Access::Public
        } else {
            Access::Protected
        }
    }

    /// Strip the mount prefix (at a segment boundary only) and a single
    /// trailing slash, except for the root path.
    fn normalize(&self, path: &str) -> String {
        let path = match &self.base_path {
            Some(base) if path == base => "/",
            Some(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) if rest.starts_with('/') => rest,
                _ => path,
            },
            None => path,
        };
        strip_trailing_slash(path).to_string()
    }
}

fn strip_trailing_slash(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PathPolicy {
        PathPolicy::new(
            vec![
                PathRule::parse("/health"),
                PathRule::parse("/auth/login"),
                PathRule::parse("/auth/register"),
                PathRule::parse("/auth/refresh"),
                PathRule::parse("/.well-known/*"),
            ],
            Some("/api".to_string()),
        )
    }

    #[test]
    fn test_every_rule_classifies_the_same_with_and_without_base_path() {
        let policy = policy();
        for rule in [
            "/health",
            "/auth/login",
            "/auth/register",
            "/auth/refresh",
            "/.well-known/jwks.json",
        ] {
            assert_eq!(policy.classify(rule), Access::Public, "bare {rule}");
            let prefixed = format!("/api{rule}");
            assert_eq!(policy.classify(&prefixed), Access::Public, "prefixed {rule}");
        }
    }

    #[test]
    fn test_protected_paths_are_protected_in_both_forms() {
        let policy = policy();
        for path in ["/auth/logout", "/users/me", "/shipments/s1/bank-details"] {
            assert_eq!(policy.classify(path), Access::Protected, "bare {path}");
            let prefixed = format!("/api{path}");
            assert_eq!(
                policy.classify(&prefixed),
                Access::Protected,
                "prefixed {path}"
            );
        }
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let policy = policy();
        assert_eq!(policy.classify("/auth/login/"), Access::Public);
        assert_eq!(policy.classify("/api/auth/login/"), Access::Public);
        // Only a single trailing slash is normalized away.
        assert_eq!(policy.classify("/auth/login//"), Access::Protected);
    }

    #[test]
    fn test_exact_rules_do_not_match_extensions() {
        let policy = policy();
        assert_eq!(policy.classify("/auth/loginx"), Access::Protected);
        assert_eq!(policy.classify("/auth/login/extra"), Access::Protected);
    }

    #[test]
    fn test_base_path_strips_only_at_segment_boundary() {
        let policy = policy();
        // "/apihealth" must not normalize to "health".
        assert_eq!(policy.classify("/apihealth"), Access::Protected);
        // The base path alone is the root, which is not public here.
        assert_eq!(policy.classify("/api"), Access::Protected);
    }

    #[test]
    fn test_prefix_rule_matches_bare_prefix_and_descendants() {
        let policy = policy();
        assert_eq!(policy.classify("/.well-known"), Access::Public);
        assert_eq!(policy.classify("/.well-known/"), Access::Public);
        assert_eq!(policy.classify("/.well-known/openapi.json"), Access::Public);
        assert_eq!(policy.classify("/.well-knownish"), Access::Protected);
    }

    #[test]
    fn test_no_base_path_configured() {
        let policy = PathPolicy::new(vec![PathRule::parse("/health")], None);
        assert_eq!(policy.classify("/health"), Access::Public);
        assert_eq!(policy.classify("/api/health"), Access::Protected);
    }

    #[test]
    fn test_root_path_is_not_stripped_to_empty() {
        let policy = PathPolicy::new(vec![PathRule::parse("/")], Some("/api".to_string()));
        assert_eq!(policy.classify("/"), Access::Public);
        assert_eq!(policy.classify("/api"), Access::Public);
        assert_eq!(policy.classify("/api/"), Access::Public);
    }
}
