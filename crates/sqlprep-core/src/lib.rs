//! sqlprep Core - Shared foundation for the SQL statement processing engine
//!
//! This crate provides the types every other sqlprep crate depends on.
//! It defines:
//!
//! - `Value` - the parameter value model covering the SQL types drivers bind
//! - `ParameterStyle` - the closed set of placeholder syntaxes
//! - `SqlDialect` / `ParameterProfile` - per-dialect placeholder policy
//! - `CompilerConfig` - validation, transformation, and caching knobs
//! - `RiskLevel` / `ValidationFinding` - severity-ranked validation output

mod config;
mod dialect;
mod error;
mod risk;
mod style;
mod types;

pub use config::*;
pub use dialect::*;
pub use error::*;
pub use risk::*;
pub use style::*;
pub use types::*;
