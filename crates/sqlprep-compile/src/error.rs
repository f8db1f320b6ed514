//! Compile-time error surface
//!
//! The pipeline itself never raises for recoverable conditions; it records
//! findings on the context. The compiler facade converts a failed context
//! into one of these typed errors at the API boundary, so callers never
//! receive a result that looks successful but is partially failed.

use crate::parameters::ConvertError;
use sqlprep_core::{ParameterStyle, RiskLevel, ValidationFinding};
use thiserror::Error;

/// Errors surfaced by the statement compiler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// SQL could not be parsed; nothing was transformed.
    #[error("failed to parse SQL: {0}")]
    Parse(String),

    /// Validation produced a blocking finding.
    #[error("validation failed at {risk} risk: {message}")]
    Validation {
        /// The primary blocking finding's message
        message: String,
        /// The highest blocking risk level
        risk: RiskLevel,
        /// Every finding the pipeline accumulated, in order
        findings: Vec<ValidationFinding>,
    },

    /// Detected placeholders and supplied parameters do not match.
    #[error("parameter mismatch: {0}")]
    ParameterMismatch(String),

    /// Placeholder conversion or payload shaping failed.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// The requested target style cannot carry this statement's
    /// placeholders.
    #[error("cannot render parameters in style '{0}'")]
    UnsupportedStyle(ParameterStyle),
}

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;
