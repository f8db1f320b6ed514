//! SQL parameter detection, conversion, and shaping
//!
//! This module finds placeholder tokens in SQL text, rewrites them between
//! the placeholder styles different databases expect, and shapes supplied
//! parameter values into the payload a target style needs.
//!
//! Detection is a pure function of the SQL text: the tokenizer never looks
//! at the dialect or the requested target style, so detection always
//! precedes conversion.
//!
//! # Example
//!
//! ```
//! use sqlprep_compile::parameters::ParameterTokenizer;
//! use sqlprep_core::ParameterStyle;
//!
//! let tokenizer = ParameterTokenizer::default();
//! let params = tokenizer.extract("SELECT * FROM users WHERE id = :id");
//! assert_eq!(params.len(), 1);
//! assert_eq!(params[0].style, ParameterStyle::ColonNamed);
//! assert_eq!(params[0].name.as_deref(), Some("id"));
//! ```

mod binding;
mod converter;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use binding::{ParameterBinding, ShapedParameters};
pub use converter::{CanonicalSql, ConvertError, ConvertResult, ParameterStyleConverter};
pub use tokenizer::{ParameterInfo, ParameterTokenizer, detected_style, detected_styles};
