//! Path pattern parsing and claim-name matching
//!
//! A pattern is an optionally prefix-wildcarded claim path. Patterns in the
//! reserved external namespace also match claims stored under local
//! (non-absolute) names.

use std::fmt;

/// Reserved external namespace prefix
pub const NAMESPACE_PREFIX: &str = "//mcvp/";

/// Sigil marking an absolute claim path
pub const ABSOLUTE_SIGIL: &str = "//";

/// Pattern used when a label requests no paths
pub const DEFAULT_PATTERN: &str = "//mcvp/*";

/// How a pattern compares against a claim name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Claim name must equal the pattern text
    Exact,
    /// Claim name must start with the text preceding `*`
    Prefix,
}

/// A parsed path pattern.
///
/// # Examples
///
/// ```
/// use cvp_claims::path::PathPattern;
///
/// let pattern = PathPattern::parse("//mcvp/topic/*");
/// assert!(pattern.matches("//MCVP/topic/sensor"));
/// assert!(pattern.matches("topic/sensor"));
/// assert!(!PathPattern::parse("//mcvp/topic").matches("//mcvp/topic/sensor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Original pattern string
    raw: String,
    /// Case-folded text before the first `*`
    absolute: String,
    /// `absolute` with the namespace prefix removed, when it had one
    local: Option<String>,
    /// Match mode
    mode: MatchMode,
}

impl PathPattern {
    /// Parses a pattern string. Every string is a valid pattern.
    pub fn parse(raw: &str) -> Self {
        let mode = if raw.ends_with('*') {
            MatchMode::Prefix
        } else {
            MatchMode::Exact
        };

        let before_star = raw.split('*').next().unwrap_or_default();
        let absolute = fold(before_star);
        let local = absolute.strip_prefix(NAMESPACE_PREFIX).map(str::to_string);

        Self {
            raw: raw.to_string(),
            absolute,
            local,
            mode,
        }
    }

    /// Returns the original pattern string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the match mode
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Checks a claim name against this pattern, case-insensitively.
    ///
    /// Absolute names (starting with `//`) are compared against the pattern
    /// as written. Local names are compared against the pattern with the
    /// namespace prefix stripped, if it carried one.
    pub fn matches(&self, claim_name: &str) -> bool {
        let name = fold(claim_name);

        let target = if name.starts_with(ABSOLUTE_SIGIL) {
            &self.absolute
        } else {
            self.local.as_ref().unwrap_or(&self.absolute)
        };

        match self.mode {
            MatchMode::Exact => name == *target,
            MatchMode::Prefix => name.starts_with(target.as_str()),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Checks whether `claim_name` matches `pattern`
pub fn matches(claim_name: &str, pattern: &str) -> bool {
    PathPattern::parse(pattern).matches(claim_name)
}
