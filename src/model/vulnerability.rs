use serde::{Deserialize, Serialize};

/// Severity levels reported by advisory databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Reads a severity label as GitHub reports it (`LOW`, `MODERATE`, ...).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "moderate" | "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// An advisory's vulnerable version range together with its metadata.
///
/// `severity` is kept as the advisory source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityMatch {
    pub range: String,
    pub severity: String,
    pub advisory_link: String,
    pub description: String,
}

impl VulnerabilityMatch {
    pub fn new(
        range: impl Into<String>,
        severity: impl Into<String>,
        advisory_link: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            range: range.into(),
            severity: severity.into(),
            advisory_link: advisory_link.into(),
            description: description.into(),
        }
    }

    pub fn severity_level(&self) -> Severity {
        Severity::from_label(&self.severity)
    }
}
