//! URI patterns an app is restricted to.

use regex::Regex;
use tracing::warn;

/// Ordered set of regular expressions matched against the request URI.
///
/// An empty registry places no restriction on the URI.
#[derive(Debug, Clone, Default)]
pub struct UriRegistry {
    /// Compiled patterns in registration order.
    patterns: Vec<Regex>,
}

impl UriRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends patterns. Returns `true` iff at least one pattern was added.
    ///
    /// Patterns that fail to compile are skipped with a warning.
    pub fn register<I, S>(&mut self, patterns: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0usize;

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Regex::new(pattern) {
                Ok(regex) => {
                    self.patterns.push(regex);
                    added += 1;
                }
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Ignoring invalid URI pattern");
                }
            }
        }

        added > 0
    }

    /// Whether an app restricted by this registry fires on `uri`.
    pub fn matches(&self, uri: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|regex| regex.is_match(uri))
    }

    /// Source text of the registered patterns.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_matches_everything() {
        let registry = UriRegistry::new();
        assert!(registry.matches(""));
        assert!(registry.matches("/"));
        assert!(registry.matches("/anything/at/all?x=1"));
    }

    #[test]
    fn test_register_reports_additions() {
        let mut registry = UriRegistry::new();
        assert!(!registry.register(Vec::<String>::new()));
        assert!(registry.register([r"^/upload/.*", r"^/$"]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let mut registry = UriRegistry::new();
        assert!(!registry.register(["(unclosed"]));
        assert!(registry.is_empty());
        assert!(registry.register(["(unclosed", "^/ok$"]));
        assert_eq!(registry.patterns(), vec!["^/ok$"]);
    }

    #[test]
    fn test_any_pattern_match_fires() {
        let mut registry = UriRegistry::new();
        registry.register([r"^/upload/", r"^/admin$"]);
        assert!(registry.matches("/upload/file.txt"));
        assert!(registry.matches("/admin"));
        assert!(!registry.matches("/admin/users"));
        assert!(!registry.matches(""));
    }
}
