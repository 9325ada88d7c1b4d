//! Selects the advisories whose vulnerable range contains a version.

use crate::error::RangeError;
use crate::model::VulnerabilityMatch;
use crate::version::{RangeExpression, Version};

/// An advisory range that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRange {
    pub range: String,
    pub error: RangeError,
}

/// Result of filtering: the applicable advisories in input order, and every
/// range that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub applicable: Vec<VulnerabilityMatch>,
    pub rejected: Vec<RejectedRange>,
}

/// Keeps the candidates whose range contains `version`, unchanged and in
/// order.
///
/// A range that cannot be parsed is excluded and listed in
/// [`FilterOutcome::rejected`]. If `version` itself cannot be parsed, no
/// candidate applies and every one is rejected with that error.
///
/// # Example
///
/// ```
/// use depscan::checker::filter_applicable;
/// use depscan::VulnerabilityMatch;
///
/// let candidates = vec![
///     VulnerabilityMatch::new("< 1.0.0", "HIGH", "https://example.com/a", "old"),
///     VulnerabilityMatch::new(">= 1.0.0, < 1.3.0", "MODERATE", "https://example.com/b", "mid"),
/// ];
/// let outcome = filter_applicable("1.2.0", &candidates);
///
/// assert_eq!(outcome.applicable, vec![candidates[1].clone()]);
/// assert!(outcome.rejected.is_empty());
/// ```
pub fn filter_applicable(version: &str, candidates: &[VulnerabilityMatch]) -> FilterOutcome {
    let subject = match Version::parse(version) {
        Ok(subject) => subject,
        Err(e) => {
            let error = RangeError::Subject(e);
            return FilterOutcome {
                applicable: Vec::new(),
                rejected: candidates
                    .iter()
                    .map(|candidate| RejectedRange {
                        range: candidate.range.clone(),
                        error: error.clone(),
                    })
                    .collect(),
            };
        }
    };

    let mut outcome = FilterOutcome::default();
    for candidate in candidates {
        match RangeExpression::parse(&candidate.range) {
            Ok(range) if range.is_satisfied_by(&subject) => {
                outcome.applicable.push(candidate.clone())
            }
            Ok(_) => {}
            Err(error) => outcome.rejected.push(RejectedRange {
                range: candidate.range.clone(),
                error,
            }),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory(range: &str, severity: &str, id: &str) -> VulnerabilityMatch {
        VulnerabilityMatch::new(
            range,
            severity,
            format!("https://github.com/advisories/{}", id),
            format!("description of {}", id),
        )
    }

    #[test]
    fn test_single_applicable_range_keeps_metadata() {
        let candidates = vec![
            advisory("< 1.0.0", "LOW", "GHSA-1111"),
            advisory(">= 1.1.0 < 1.3.0", "HIGH", "GHSA-2222"),
            advisory(">= 2.0.0", "CRITICAL", "GHSA-3333"),
        ];

        let outcome = filter_applicable("1.2.0", &candidates);
        assert_eq!(outcome.applicable, vec![candidates[1].clone()]);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let candidates = vec![
            advisory("<= 3.0", "HIGH", "GHSA-b"),
            advisory("^2.0.0", "LOW", "GHSA-a"),
            advisory("= 2.5.1", "MODERATE", "GHSA-c"),
        ];

        let outcome = filter_applicable("2.5.1", &candidates);
        assert_eq!(outcome.applicable, candidates);
    }

    #[test]
    fn test_malformed_range_is_rejected_not_fatal() {
        let candidates = vec![
            advisory(">= 1.0.0-beta", "HIGH", "GHSA-bad"),
            advisory("< 2.0.0", "LOW", "GHSA-good"),
        ];

        let outcome = filter_applicable("1.5.0", &candidates);
        assert_eq!(outcome.applicable, vec![candidates[1].clone()]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].range, ">= 1.0.0-beta");
        assert!(matches!(outcome.rejected[0].error, RangeError::Clause { .. }));
    }

    #[test]
    fn test_unparseable_version_rejects_everything() {
        let candidates = vec![
            advisory("< 2.0.0", "LOW", "GHSA-x"),
            advisory(">= 0", "LOW", "GHSA-y"),
        ];

        let outcome = filter_applicable("v0.0.0-20210101000000-abcdef123456", &candidates);
        assert!(outcome.applicable.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
        assert!(outcome
            .rejected
            .iter()
            .all(|r| matches!(r.error, RangeError::Subject(_))));
    }

    #[test]
    fn test_empty_range_matches_nothing() {
        let outcome = filter_applicable("1.0.0", &[advisory("", "LOW", "GHSA-empty")]);
        assert!(outcome.applicable.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let candidates = vec![
            advisory("~1.2.0", "HIGH", "GHSA-t"),
            advisory("> 5", "LOW", "GHSA-u"),
        ];
        assert_eq!(
            filter_applicable("1.2.9", &candidates),
            filter_applicable("1.2.9", &candidates)
        );
    }
}
