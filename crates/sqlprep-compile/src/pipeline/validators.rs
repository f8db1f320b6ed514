//! Validation-phase processors
//!
//! Safety checks run before any transformation: DML statements that would
//! touch every row, DDL categories outside the allow-list, placeholder
//! styles the dialect rejects, and mismatches between detected placeholders
//! and supplied values.

use super::{ProcessingContext, ProcessorError};
use crate::parameters::detected_styles;
use serde::{Deserialize, Serialize};
use sqlparser::ast::{Delete, FromTable, Statement};
use sqlprep_core::{CompilerConfig, DdlKind, RiskLevel, ValidationFinding};

/// Broad statement classification by AST node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementCategory {
    /// Data Query Language (SELECT)
    Dql,
    /// Data Manipulation Language (INSERT, UPDATE, DELETE, MERGE)
    Dml,
    /// Data Definition Language (CREATE, ALTER, DROP, TRUNCATE)
    Ddl,
    /// Data Control Language (GRANT, REVOKE)
    Dcl,
    /// Transaction Control (BEGIN, COMMIT, ROLLBACK, SAVEPOINT)
    Tcl,
    /// Anything else (SET, SHOW, EXPLAIN, ...)
    Other,
}

impl StatementCategory {
    /// Classify a parsed statement
    pub fn of(statement: &Statement) -> Self {
        match statement {
            Statement::Query(_) => Self::Dql,
            Statement::Insert(_)
            | Statement::Update { .. }
            | Statement::Delete(_)
            | Statement::Merge { .. } => Self::Dml,
            Statement::CreateTable(_)
            | Statement::CreateView { .. }
            | Statement::CreateIndex(_)
            | Statement::CreateSchema { .. }
            | Statement::AlterTable { .. }
            | Statement::Drop { .. }
            | Statement::Truncate { .. } => Self::Ddl,
            Statement::Grant { .. } | Statement::Revoke { .. } => Self::Dcl,
            Statement::StartTransaction { .. }
            | Statement::Commit { .. }
            | Statement::Rollback { .. }
            | Statement::Savepoint { .. }
            | Statement::ReleaseSavepoint { .. } => Self::Tcl,
            _ => Self::Other,
        }
    }

    /// Returns the category as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dql => "dql",
            Self::Dml => "dml",
            Self::Ddl => "ddl",
            Self::Dcl => "dcl",
            Self::Tcl => "tcl",
            Self::Other => "other",
        }
    }
}

const DML_SAFETY: &str = "dml_safety";

/// DML/DDL safety validator: flags UPDATE/DELETE without WHERE as high risk
/// and DDL categories outside the allow-list as critical.
pub(super) fn dml_safety(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let findings = {
        let Some(statement) = ctx.statement() else {
            return Ok(());
        };
        inspect_statement(statement, ctx.config())
    };
    for finding in findings {
        ctx.push_finding(finding);
    }
    Ok(())
}

fn inspect_statement(statement: &Statement, config: &CompilerConfig) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    match statement {
        Statement::Delete(delete) => {
            if delete.selection.is_none() && config.enforce_where {
                let table = delete_target(delete);
                findings.push(ValidationFinding::new(
                    DML_SAFETY,
                    "delete_without_where",
                    RiskLevel::High,
                    format!(
                        "DELETE on '{}' has no WHERE clause and would remove every row",
                        table
                    ),
                ));
            }
        }
        Statement::Update {
            table, selection, ..
        } => {
            if selection.is_none() && config.enforce_where {
                findings.push(ValidationFinding::new(
                    DML_SAFETY,
                    "update_without_where",
                    RiskLevel::High,
                    format!(
                        "UPDATE on '{}' has no WHERE clause and would modify every row",
                        table.relation
                    ),
                ));
            }
        }
        Statement::Drop { names, .. } => {
            check_ddl(&mut findings, config, DdlKind::Drop, || {
                names
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            });
        }
        Statement::Truncate { table_names, .. } => {
            check_ddl(&mut findings, config, DdlKind::Truncate, || {
                table_names
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            });
        }
        Statement::CreateTable(create) => {
            check_ddl(&mut findings, config, DdlKind::Create, || {
                create.name.to_string()
            });
        }
        Statement::CreateView { name, .. } => {
            check_ddl(&mut findings, config, DdlKind::Create, || name.to_string());
        }
        Statement::CreateIndex(create) => {
            check_ddl(&mut findings, config, DdlKind::Create, || {
                create.table_name.to_string()
            });
        }
        Statement::CreateSchema {
            schema_name, ..
        } => {
            check_ddl(&mut findings, config, DdlKind::Create, || {
                schema_name.to_string()
            });
        }
        Statement::AlterTable { name, .. } => {
            check_ddl(&mut findings, config, DdlKind::Alter, || name.to_string());
        }
        _ => {}
    }

    findings
}

fn check_ddl(
    findings: &mut Vec<ValidationFinding>,
    config: &CompilerConfig,
    kind: DdlKind,
    objects: impl FnOnce() -> String,
) {
    if !config.ddl_allowed(kind) {
        findings.push(ValidationFinding::new(
            DML_SAFETY,
            "ddl_not_allowed",
            RiskLevel::Critical,
            format!(
                "{} statements are not allowed by this configuration (objects: {})",
                kind.as_str().to_uppercase(),
                objects()
            ),
        ));
    }
}

/// Best-effort table name for a DELETE: multi-table form first, then the
/// FROM clause.
fn delete_target(delete: &Delete) -> String {
    if let Some(name) = delete.tables.first() {
        return name.to_string();
    }
    let tables = match &delete.from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
    };
    tables
        .first()
        .map(|t| t.relation.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

const PARAMETER_STYLE: &str = "parameter_style";

/// Parameter-style validator: rejects styles outside the dialect profile,
/// mixed styles unless permitted, and cross-checks detected placeholders
/// against the supplied values.
pub(super) fn parameter_style(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let profile = ctx.config().effective_profile();
    let strict = ctx.config().strict_parameters;
    let infos = ctx.parameters();

    let styles = detected_styles(&infos);
    for style in &styles {
        if !profile.allows(*style) {
            ctx.add_error(
                PARAMETER_STYLE,
                "parameter_style_not_allowed",
                RiskLevel::Critical,
                format!(
                    "parameter style '{}' is not allowed for dialect '{}'",
                    style,
                    ctx.dialect()
                ),
            );
        }
    }
    if styles.len() > 1 && !profile.allow_mixed {
        let listed = styles
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ctx.add_error(
            PARAMETER_STYLE,
            "mixed_parameter_styles",
            RiskLevel::Critical,
            format!("statement mixes parameter styles: {}", listed),
        );
    }

    // Cross-check placeholders against the supplied payload. Strictness
    // only changes the risk level: critical aborts, medium is reported
    // alongside a usable result.
    let mismatch_risk = if strict {
        RiskLevel::Critical
    } else {
        RiskLevel::Medium
    };

    let mut required_names: Vec<&str> = Vec::new();
    let mut max_explicit = 0usize;
    let mut anon_count = 0usize;
    for info in infos.iter() {
        if let Some(name) = &info.name {
            if !required_names.contains(&name.as_str()) {
                required_names.push(name);
            }
        } else if let Some(index) = info.explicit_index() {
            max_explicit = max_explicit.max(index);
        } else {
            anon_count += 1;
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for name in &required_names {
        if ctx.binding().get_named(name).is_none() {
            missing.push((*name).to_string());
        }
    }
    let required_positional = max_explicit.max(anon_count);
    let supplied_positional = ctx.binding().positional_values().len();

    if !missing.is_empty() {
        ctx.add_error(
            PARAMETER_STYLE,
            "parameter_mismatch",
            mismatch_risk,
            format!("no value supplied for parameter(s): {}", missing.join(", ")),
        );
    }
    if supplied_positional < required_positional {
        ctx.add_error(
            PARAMETER_STYLE,
            "parameter_mismatch",
            mismatch_risk,
            format!(
                "statement expects {} positional parameter(s), got {}",
                required_positional, supplied_positional
            ),
        );
    }
    if supplied_positional > required_positional {
        ctx.add_error(
            PARAMETER_STYLE,
            "unused_parameters",
            RiskLevel::Low,
            format!(
                "{} positional parameter(s) supplied but only {} used",
                supplied_positional, required_positional
            ),
        );
    }
    let unused_named: Vec<String> = ctx
        .binding()
        .named_values()
        .map(|named| {
            named
                .keys()
                .filter(|k| !required_names.contains(&k.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    if !unused_named.is_empty() {
        ctx.add_error(
            PARAMETER_STYLE,
            "unused_parameters",
            RiskLevel::Low,
            format!(
                "named parameter(s) never referenced: {}",
                unused_named.join(", ")
            ),
        );
    }

    Ok(())
}

/// Analyze-phase processor: records statement diagnostics into metadata.
pub(super) fn analyze_statement(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let Some((category, rendered_length)) = ctx
        .statement()
        .map(|s| (StatementCategory::of(s), s.to_string().len()))
    else {
        return Ok(());
    };
    ctx.insert_metadata(
        "statement_category",
        serde_json::json!(category.as_str()),
    );
    ctx.insert_metadata(
        "placeholder_count",
        serde_json::json!(ctx.parameters().len()),
    );
    ctx.insert_metadata("rendered_length", serde_json::json!(rendered_length));
    Ok(())
}
