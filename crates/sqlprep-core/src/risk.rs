//! Risk levels and validation findings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity ranking attached to a validation finding, determining whether a
/// compile aborts or merely reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No risk; informational only
    Safe,
    /// Minor finding, never blocks
    Low,
    /// Worth surfacing; blocks only when configured strictly
    Medium,
    /// Dangerous; blocks under strict safety (the default)
    High,
    /// Always blocks the compile
    Critical,
}

impl RiskLevel {
    /// Returns true if this is a critical finding
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Returns true if this is at least high risk
    pub fn is_high_or_above(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Returns the risk level as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding produced by a pipeline processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Human-readable description of the problem
    pub message: String,
    /// Stable machine-readable code (`delete_without_where`, ...)
    pub code: String,
    /// Severity of the finding
    pub risk: RiskLevel,
    /// Name of the processor that produced the finding
    pub processor: String,
}

impl ValidationFinding {
    /// Create a new finding
    pub fn new(
        processor: impl Into<String>,
        code: impl Into<String>,
        risk: RiskLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            risk,
            processor: processor.into(),
        }
    }
}
