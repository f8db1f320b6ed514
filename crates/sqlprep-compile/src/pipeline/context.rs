//! Per-call processing context
//!
//! A `ProcessingContext` is owned by exactly one compile call and carries
//! the statement, parameters, and accumulated diagnostics through the
//! pipeline phases. It is never shared across calls and is read-only once
//! the pipeline finishes.

use crate::parameters::{ParameterBinding, ParameterInfo};
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlprep_core::{
    CompilerConfig, RiskLevel, SqlDialect, TypedParameter, ValidationFinding,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A before/after diagnostic recorded by a transformer, only when the
/// rendered SQL actually changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRecord {
    /// Name of the processor that performed the transformation
    pub processor: String,
    /// Rendered SQL before the transformation
    pub before: String,
    /// Rendered SQL after the transformation
    pub after: String,
}

/// Mutable per-call record carrying the statement, parameters, accumulated
/// findings, and diagnostics through the pipeline.
pub struct ProcessingContext<'a> {
    sql: String,
    dialect: SqlDialect,
    config: &'a CompilerConfig,
    statement: Option<Statement>,
    parameters: Arc<Vec<ParameterInfo>>,
    binding: ParameterBinding,
    promoted: Vec<TypedParameter>,
    hints: Vec<String>,
    findings: Vec<ValidationFinding>,
    transformations: Vec<TransformationRecord>,
    metadata: HashMap<String, serde_json::Value>,
}

impl<'a> ProcessingContext<'a> {
    /// Create a context for one compile call.
    pub fn new(
        sql: impl Into<String>,
        config: &'a CompilerConfig,
        parameters: Arc<Vec<ParameterInfo>>,
        binding: ParameterBinding,
    ) -> Self {
        Self {
            sql: sql.into(),
            dialect: config.dialect,
            config,
            statement: None,
            parameters,
            binding,
            promoted: Vec::new(),
            hints: Vec::new(),
            findings: Vec::new(),
            transformations: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// The original SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The dialect in effect
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// The configuration in effect
    pub fn config(&self) -> &CompilerConfig {
        self.config
    }

    /// The parsed statement, if parsing succeeded.
    ///
    /// Must not be used once [`has_errors`](Self::has_errors) is true.
    pub fn statement(&self) -> Option<&Statement> {
        self.statement.as_ref()
    }

    /// Install the parsed statement
    pub fn set_statement(&mut self, statement: Statement) {
        self.statement = Some(statement);
    }

    /// Take the statement out for mutation; pair with
    /// [`set_statement`](Self::set_statement).
    pub fn take_statement(&mut self) -> Option<Statement> {
        self.statement.take()
    }

    /// Detected placeholders, in scan order
    pub fn parameters(&self) -> Arc<Vec<ParameterInfo>> {
        Arc::clone(&self.parameters)
    }

    /// The supplied parameter values
    pub fn binding(&self) -> &ParameterBinding {
        &self.binding
    }

    /// Parameters synthesized from promoted literals
    pub fn promoted(&self) -> &[TypedParameter] {
        &self.promoted
    }

    /// Record a promoted literal
    pub fn push_promoted(&mut self, parameter: TypedParameter) {
        self.promoted.push(parameter);
    }

    /// Optimizer hints preserved by the comment stripper
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Record preserved optimizer hints
    pub fn set_hints(&mut self, hints: Vec<String>) {
        self.hints = hints;
    }

    /// All findings accumulated so far, in order
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Record a finding
    pub fn push_finding(&mut self, finding: ValidationFinding) {
        self.findings.push(finding);
    }

    /// Record a finding from its parts
    pub fn add_error(
        &mut self,
        processor: &str,
        code: &str,
        risk: RiskLevel,
        message: impl Into<String>,
    ) {
        self.findings
            .push(ValidationFinding::new(processor, code, risk, message));
    }

    /// Whether any finding blocks the compile under the current
    /// configuration: critical always, high when strict safety is on.
    pub fn has_errors(&self) -> bool {
        self.blocking_risk().is_some()
    }

    /// The highest blocking risk among findings, if any blocks.
    pub fn blocking_risk(&self) -> Option<RiskLevel> {
        self.findings
            .iter()
            .map(|f| f.risk)
            .filter(|risk| {
                risk.is_critical() || (self.config.strict_safety && risk.is_high_or_above())
            })
            .max()
    }

    /// Transformation diagnostics, in order
    pub fn transformations(&self) -> &[TransformationRecord] {
        &self.transformations
    }

    /// Record a transformation diagnostic
    pub fn record_transformation(
        &mut self,
        processor: &str,
        before: impl Into<String>,
        after: impl Into<String>,
    ) {
        self.transformations.push(TransformationRecord {
            processor: processor.to_string(),
            before: before.into(),
            after: after.into(),
        });
    }

    /// Free-form diagnostics recorded by processors
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Record a diagnostic value
    pub fn insert_metadata(&mut self, key: &str, value: serde_json::Value) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Decompose the finished context into the pieces the compiler keeps.
    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<Statement>,
        Vec<TypedParameter>,
        Vec<String>,
        Vec<ValidationFinding>,
        Vec<TransformationRecord>,
        HashMap<String, serde_json::Value>,
    ) {
        (
            self.statement,
            self.promoted,
            self.hints,
            self.findings,
            self.transformations,
            self.metadata,
        )
    }
}
