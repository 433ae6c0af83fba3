//! Path-based claim filtering
//!
//! This module provides case-insensitive matching of claim names against
//! exact or prefix-wildcard path patterns, and bucketing of claims under
//! caller-chosen labels.
//!
//! # Examples
//!
//! ```
//! use cvp_claims::path::matches;
//!
//! assert!(matches("//mcvp/topic/a", "//mcvp/*"));
//! assert!(!matches("//mcvp/topic/a", "//mcvp/topic"));
//! assert!(matches("topic/a", "topic*"));
//! ```

mod matcher;
mod pattern;


pub use matcher::{LabeledClaimSets, PathMatcher};
pub use pattern::{
    matches, MatchMode, PathPattern, ABSOLUTE_SIGIL, DEFAULT_PATTERN, NAMESPACE_PREFIX,
};
