//! Identifier matching.
//!
//! Every lookup and comparison in the model goes through [`NameMatch`]
//! so that a single setting decides whether `Users` and `users` name the
//! same table.

use serde::{Deserialize, Serialize};

/// How identifiers are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// Identifiers match only when byte-for-byte equal.
    #[default]
    CaseSensitive,
    /// Identifiers match after Unicode lower-case folding.
    ///
    /// Folding is locale-independent, so the result does not depend on the
    /// machine running the comparison.
    CaseInsensitive,
}

impl NameMatch {
    /// Returns the matching mode for a `case_sensitive` flag.
    #[must_use]
    pub const fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            Self::CaseSensitive
        } else {
            Self::CaseInsensitive
        }
    }

    /// Returns `true` if the two identifiers name the same thing.
    #[must_use]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::CaseInsensitive => {
                a == b
                    || a.chars()
                        .flat_map(char::to_lowercase)
                        .eq(b.chars().flat_map(char::to_lowercase))
            }
        }
    }

    /// Compares two optional identifiers. Two absent names are equal.
    #[must_use]
    pub fn matches_opt(self, a: Option<&str>, b: Option<&str>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.matches(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Compares two ordered identifier lists element by element.
    #[must_use]
    pub fn matches_all(self, a: &[String], b: &[String]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.matches(x, y))
    }

    /// Returns `true` if `names` contains `name`.
    #[must_use]
    pub fn contains(self, names: &[String], name: &str) -> bool {
        names.iter().any(|n| self.matches(n, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_sensitive_requires_exact_match() {
        let names = NameMatch::CaseSensitive;
        assert!(names.matches("users", "users"));
        assert!(!names.matches("Users", "users"));
    }

    #[test]
    fn case_insensitive_folds_unicode() {
        let names = NameMatch::CaseInsensitive;
        assert!(names.matches("Users", "USERS"));
        assert!(names.matches("ÉTAT", "état"));
        assert!(!names.matches("user", "users"));
    }

    #[test]
    fn optional_names() {
        let names = NameMatch::CaseInsensitive;
        assert!(names.matches_opt(None, None));
        assert!(names.matches_opt(Some("IDX"), Some("idx")));
        assert!(!names.matches_opt(Some("idx"), None));
    }

    #[test]
    fn ordered_lists() {
        let names = NameMatch::CaseInsensitive;
        let a = vec!["A".to_string(), "b".to_string()];
        let b = vec!["a".to_string(), "B".to_string()];
        let c = vec!["b".to_string(), "a".to_string()];
        assert!(names.matches_all(&a, &b));
        assert!(!names.matches_all(&a, &c));
        assert!(names.contains(&a, "B"));
    }
}
