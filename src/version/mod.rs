//! Numeric versions and version-range evaluation.
//!
//! A [`Version`] is a dotted sequence of unsigned integers. Anything else
//! (pre-release tags, Go pseudo-versions, commit hashes) fails to parse and
//! the failure is returned to the caller instead of being guessed around.
//!
//! # Example
//!
//! ```
//! use depscan::version::{matches, Version};
//!
//! assert!(Version::parse("1.2").unwrap() == Version::parse("1.2.0").unwrap());
//! assert!(matches("1.4.2", "^1.0.0"));
//! assert!(!matches("2.0.0", ">=1.0.0 <2.0.0"));
//! ```

mod range;

pub use range::{evaluate, matches, Clause, RangeExpression};

use crate::error::VersionError;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Parses a dotted-decimal version. A single leading `v` is accepted.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        if body.is_empty() {
            return Err(VersionError::Empty);
        }

        let components = body
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionError::NonNumeric {
                        version: trimmed.to_string(),
                        component: part.to_string(),
                    });
                }
                part.parse::<u64>().map_err(|_| VersionError::NonNumeric {
                    version: trimmed.to_string(),
                    component: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    pub fn from_components(components: Vec<u64>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn major(&self) -> u64 {
        self.component(0)
    }

    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }

    /// Smallest version with a higher major component: `(major+1).0.0`.
    pub fn next_major(&self) -> Self {
        Self::from_components(vec![self.major().saturating_add(1), 0, 0])
    }

    /// Smallest version with a higher minor component: `major.(minor+1).0`.
    pub fn next_minor(&self) -> Self {
        Self::from_components(vec![self.major(), self.minor().saturating_add(1), 0])
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}
