//! Phase-ordered statement processing pipeline
//!
//! Processors are a closed set of tagged variants, each belonging to
//! exactly one phase: VALIDATE runs first and always to completion,
//! TRANSFORM and ANALYZE are skipped as soon as the context carries a
//! blocking finding. A processor failure is converted into a critical
//! finding tagged with the processor's name rather than propagating, so a
//! pipeline run never panics or raises for recoverable conditions. There is
//! no partial success: either every processor ran clean, or the context is
//! failed and its statement must not be used.

mod context;
mod transformers;
mod validators;

#[cfg(test)]
mod tests;

pub use context::{ProcessingContext, TransformationRecord};
pub use validators::StatementCategory;

use crate::parameters::{ConvertError, ParameterStyleConverter};
use sqlparser::parser::Parser;
use sqlprep_core::{CompilerConfig, RiskLevel};
use thiserror::Error;

/// Unexpected failure inside a processor; converted by the pipeline into a
/// critical finding.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessorError(pub String);

impl From<ConvertError> for ProcessorError {
    fn from(err: ConvertError) -> Self {
        Self(err.to_string())
    }
}

/// Pipeline phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Safety and consistency checks; always runs to completion
    Validate,
    /// Statement rewrites; skipped once the context has blocking findings
    Transform,
    /// Diagnostics over the final statement
    Analyze,
}

/// The closed set of processors the pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    /// Flags destructive DML without WHERE and disallowed DDL
    DmlSafety,
    /// Checks placeholder styles against the dialect profile and the
    /// supplied values
    ParameterStyle,
    /// Removes comments, preserving optimizer hints
    CommentStripper,
    /// Replaces literals with synthetic parameters
    LiteralPromoter,
    /// Constant folding and boolean simplification
    Simplifier,
    /// Records statement diagnostics into metadata
    StatementAnalyzer,
}

impl Processor {
    /// Stable name used to tag findings and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::DmlSafety => "dml_safety",
            Self::ParameterStyle => "parameter_style",
            Self::CommentStripper => "comment_stripper",
            Self::LiteralPromoter => "literal_promoter",
            Self::Simplifier => "simplifier",
            Self::StatementAnalyzer => "statement_analyzer",
        }
    }

    /// The phase this processor belongs to; phases are mutually exclusive
    /// per processor.
    pub fn phase(&self) -> Phase {
        match self {
            Self::DmlSafety | Self::ParameterStyle => Phase::Validate,
            Self::CommentStripper | Self::LiteralPromoter | Self::Simplifier => Phase::Transform,
            Self::StatementAnalyzer => Phase::Analyze,
        }
    }

    /// Run this processor against the shared context
    pub fn process(&self, ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
        match self {
            Self::DmlSafety => validators::dml_safety(ctx),
            Self::ParameterStyle => validators::parameter_style(ctx),
            Self::CommentStripper => transformers::strip_comments(ctx),
            Self::LiteralPromoter => transformers::promote_literals(ctx),
            Self::Simplifier => transformers::simplify(ctx),
            Self::StatementAnalyzer => validators::analyze_statement(ctx),
        }
    }
}

/// Builder collecting processors before sorting them by phase
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    processors: Vec<Processor>,
}

impl PipelineBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor
    pub fn with(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sort registered processors by phase (stable, so registration order
    /// is preserved within a phase) and produce the pipeline.
    pub fn build(mut self) -> Pipeline {
        self.processors.sort_by_key(|p| p.phase());
        Pipeline {
            processors: self.processors,
        }
    }
}

/// Phase-ordered processor chain with short-circuit-on-error semantics
#[derive(Debug)]
pub struct Pipeline {
    processors: Vec<Processor>,
}

impl Pipeline {
    /// Start building a pipeline
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The standard pipeline for a configuration: validators always,
    /// transformers per config flags, the analyzer last.
    pub fn for_config(config: &CompilerConfig) -> Self {
        let mut builder = Self::builder()
            .with(Processor::DmlSafety)
            .with(Processor::ParameterStyle);
        if config.strip_comments {
            builder = builder.with(Processor::CommentStripper);
        }
        if config.promote_literals {
            builder = builder.with(Processor::LiteralPromoter);
        }
        if config.simplify {
            builder = builder.with(Processor::Simplifier);
        }
        builder.with(Processor::StatementAnalyzer).build()
    }

    /// The processors in execution order
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    /// Run the pipeline against one context.
    ///
    /// Parses the context's SQL first when no statement is present; a parse
    /// failure records a critical finding and terminates immediately.
    #[tracing::instrument(skip(self, ctx), fields(dialect = %ctx.dialect(), sql_preview = %ctx.sql().chars().take(100).collect::<String>()))]
    pub fn run(&self, ctx: &mut ProcessingContext<'_>) {
        if ctx.statement().is_none() {
            self.parse_into(ctx);
            if ctx.has_errors() {
                tracing::debug!("parse failed, terminating pipeline");
                return;
            }
        }

        for processor in &self.processors {
            if processor.phase() != Phase::Validate && ctx.has_errors() {
                tracing::debug!(
                    processor = processor.name(),
                    "skipping remaining processors after blocking finding"
                );
                break;
            }
            if let Err(err) = processor.process(ctx) {
                tracing::error!(processor = processor.name(), error = %err, "processor failed");
                ctx.add_error(
                    processor.name(),
                    "processor_failure",
                    RiskLevel::Critical,
                    format!("processor '{}' failed: {}", processor.name(), err),
                );
                break;
            }
        }
    }

    /// Canonicalize placeholders and parse the SQL under the configured
    /// dialect.
    fn parse_into(&self, ctx: &mut ProcessingContext<'_>) {
        let parameters = ctx.parameters();
        let canonical = ParameterStyleConverter::canonicalize(ctx.sql(), &parameters);
        let dialect = ctx.dialect().parser_dialect();

        match Parser::parse_sql(dialect.as_ref(), &canonical.sql) {
            Ok(mut statements) => match statements.len() {
                1 => {
                    if let Some(statement) = statements.pop() {
                        ctx.set_statement(statement);
                    }
                }
                0 => ctx.add_error(
                    "pipeline",
                    "empty_statement",
                    RiskLevel::Critical,
                    "no SQL statement to process",
                ),
                n => ctx.add_error(
                    "pipeline",
                    "multiple_statements",
                    RiskLevel::Critical,
                    format!("expected a single statement, found {}", n),
                ),
            },
            Err(err) => {
                tracing::debug!(error = %err, "failed to parse SQL");
                ctx.add_error(
                    "pipeline",
                    "parse_error",
                    RiskLevel::Critical,
                    format!("failed to parse SQL: {}", err),
                );
            }
        }
    }
}
