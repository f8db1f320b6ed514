//! sqlprep Compile - the SQL statement processing engine
//!
//! This crate turns raw SQL text plus heterogeneous parameter inputs into a
//! deterministic, cacheable compiled statement. It provides:
//!
//! - `ParameterTokenizer` - placeholder detection across nine styles,
//!   skipping string/comment/cast literals
//! - `ParameterStyleConverter` - placeholder rewriting between styles
//! - `Pipeline` / `ProcessingContext` - phase-ordered validators and
//!   transformers with short-circuit-on-error semantics
//! - `StatementCache` - bounded, thread-safe LRU of compiled statements
//! - `StatementCompiler` - the facade orchestrating all of the above

pub mod cache;
mod compiler;
mod error;
pub mod parameters;
pub mod pipeline;

pub use cache::{CacheKey, CacheStats, StatementCache};
pub use compiler::{Compiled, CompiledState, StatementCompiler};
pub use error::{CompileError, CompileResult};
pub use parameters::{
    CanonicalSql, ConvertError, ParameterBinding, ParameterInfo, ParameterStyleConverter,
    ParameterTokenizer, ShapedParameters, detected_style, detected_styles,
};
pub use pipeline::{
    Phase, Pipeline, PipelineBuilder, ProcessingContext, Processor, ProcessorError,
    StatementCategory, TransformationRecord,
};
