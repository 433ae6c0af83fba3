//! Label bucketing of claims by path patterns

use indexmap::{IndexMap, IndexSet};

use super::pattern::{PathPattern, DEFAULT_PATTERN};
use crate::types::{Claim, Label, LabeledClaims, LabeledPaths};

/// `label → deduplicated claims` in first-match order
pub type LabeledClaimSets = IndexMap<Label, IndexSet<Claim>>;

/// Filters claim lists into caller-labeled buckets
///
/// # Examples
///
/// ```
/// use cvp_claims::path::PathMatcher;
/// use cvp_claims::{Claim, LabeledPaths};
///
/// let claims = vec![Claim::single("//mcvp/a", "1"), Claim::single("//other/b", "2")];
/// let mut labels = LabeledPaths::new();
/// labels.insert("ALL".to_string(), vec![]);
///
/// let buckets = PathMatcher::new().filter_by_label(&claims, &labels);
/// assert_eq!(buckets["ALL"].len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatcher;

impl PathMatcher {
    /// Creates a new matcher
    pub fn new() -> Self {
        Self
    }

    /// Checks if a claim name matches a pattern
    pub fn matches(&self, claim_name: &str, pattern: &str) -> bool {
        PathPattern::parse(pattern).matches(claim_name)
    }

    /// Checks if a claim name matches any pattern in a list
    pub fn matches_any(&self, claim_name: &str, patterns: &[PathPattern]) -> bool {
        patterns.iter().any(|p| p.matches(claim_name))
    }

    /// Buckets `claims` under each requested label.
    ///
    /// A label with no patterns uses [`DEFAULT_PATTERN`]. Each label's bucket
    /// is the union of the claims matched by any of its patterns, visited
    /// pattern by pattern, with duplicates removed.
    pub fn filter_by_label(&self, claims: &[Claim], labeled_paths: &LabeledPaths) -> LabeledClaimSets {
        labeled_paths
            .iter()
            .map(|(label, paths)| (label.clone(), self.filter_paths(claims, paths)))
            .collect()
    }

    /// Same as [`filter_by_label`](Self::filter_by_label), with buckets as plain lists
    pub fn filter_to_lists(&self, claims: &[Claim], labeled_paths: &LabeledPaths) -> LabeledClaims {
        self.filter_by_label(claims, labeled_paths)
            .into_iter()
            .map(|(label, set)| (label, set.into_iter().collect()))
            .collect()
    }

    fn filter_paths(&self, claims: &[Claim], paths: &[String]) -> IndexSet<Claim> {
        let patterns: Vec<PathPattern> = if paths.is_empty() {
            vec![PathPattern::parse(DEFAULT_PATTERN)]
        } else {
            paths.iter().map(|p| PathPattern::parse(p)).collect()
        };

        let mut matched = IndexSet::new();
        for pattern in &patterns {
            for claim in claims {
                if pattern.matches(&claim.name) {
                    matched.insert(claim.clone());
                }
            }
        }

        matched
    }
}
