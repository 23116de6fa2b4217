//! A single read/write access rule.

use regex::Regex;

/// Either a literal name or a regular expression tested against a database
/// name. Regex compile/match errors are treated as no-match, never as a hard
/// failure — a misconfigured matcher should deny, not crash the coordinator.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub is_regex: bool,
    pub pattern: String,
}

impl Matcher {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: false,
            pattern: pattern.into(),
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            pattern: pattern.into(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.is_regex {
            // `Regex::is_match` matches anywhere in the string; anchor at
            // compile time rather than checking an unanchored match's span,
            // since leftmost-first semantics can pick a match that doesn't
            // span the whole string even when an anchored alternative would.
            Regex::new(&format!("^(?:{})$", self.pattern))
                .map(|re| re.is_match(name))
                .unwrap_or(false)
        } else {
            self.pattern == name
        }
    }
}
