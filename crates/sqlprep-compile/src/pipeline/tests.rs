//! Tests for the processing pipeline, validators, and transformers

use super::{Phase, Pipeline, ProcessingContext, Processor};
use crate::parameters::{ParameterBinding, ParameterTokenizer};
use pretty_assertions::assert_eq;
use sqlprep_core::{CompilerConfig, DdlKind, RiskLevel, SqlDialect};

fn run_pipeline<'a>(sql: &str, config: &'a CompilerConfig) -> ProcessingContext<'a> {
    run_pipeline_with(sql, config, ParameterBinding::None)
}

fn run_pipeline_with<'a>(
    sql: &str,
    config: &'a CompilerConfig,
    binding: ParameterBinding,
) -> ProcessingContext<'a> {
    let tokenizer = ParameterTokenizer::default();
    let infos = tokenizer.extract(sql);
    let mut ctx = ProcessingContext::new(sql, config, infos, binding);
    Pipeline::for_config(config).run(&mut ctx);
    ctx
}

#[test]
fn test_builder_orders_processors_by_phase() {
    let pipeline = Pipeline::builder()
        .with(Processor::Simplifier)
        .with(Processor::StatementAnalyzer)
        .with(Processor::DmlSafety)
        .build();
    let phases: Vec<Phase> = pipeline.processors().iter().map(|p| p.phase()).collect();
    assert_eq!(phases, vec![Phase::Validate, Phase::Transform, Phase::Analyze]);
    assert_eq!(pipeline.processors()[0], Processor::DmlSafety);
}

#[test]
fn test_parse_failure_is_critical_and_terminal() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("THIS IS NOT SQL AT ALL ;;;", &config);
    assert!(ctx.has_errors());
    let finding = &ctx.findings()[0];
    assert_eq!(finding.code, "parse_error");
    assert_eq!(finding.risk, RiskLevel::Critical);
    // Nothing after the parse step ran.
    assert!(ctx.statement().is_none());
    assert!(ctx.transformations().is_empty());
    assert!(ctx.metadata().is_empty());
}

#[test]
fn test_multiple_statements_rejected() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("SELECT 1; SELECT 2", &config);
    assert!(ctx.has_errors());
    assert_eq!(ctx.findings()[0].code, "multiple_statements");
}

#[test]
fn test_update_without_where_is_high_risk() {
    let config = CompilerConfig::for_dialect(SqlDialect::Sqlite);
    let ctx = run_pipeline_with(
        "UPDATE t SET x = ?",
        &config,
        ParameterBinding::positional([1i64]),
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "update_without_where")
        .expect("finding present");
    assert_eq!(finding.risk, RiskLevel::High);
    assert_eq!(finding.processor, "dml_safety");
    assert!(ctx.has_errors());
}

#[test]
fn test_update_with_where_is_clean() {
    let config = CompilerConfig::for_dialect(SqlDialect::Sqlite);
    let ctx = run_pipeline_with(
        "UPDATE t SET x = ? WHERE id = ?",
        &config,
        ParameterBinding::positional([1i64, 2i64]),
    );
    assert!(!ctx.has_errors());
    assert!(ctx.findings().is_empty());
}

#[test]
fn test_delete_without_where_names_the_table() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("DELETE FROM accounts", &config);
    let finding = &ctx.findings()[0];
    assert_eq!(finding.code, "delete_without_where");
    assert!(finding.message.contains("accounts"));
}

#[test]
fn test_enforce_where_can_be_disabled() {
    let config = CompilerConfig::default().with_enforce_where(false);
    let ctx = run_pipeline("DELETE FROM accounts", &config);
    assert!(!ctx.has_errors());
}

#[test]
fn test_drop_requires_allow_listing() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("DROP TABLE t", &config);
    let finding = &ctx.findings()[0];
    assert_eq!(finding.code, "ddl_not_allowed");
    assert_eq!(finding.risk, RiskLevel::Critical);

    let permissive = CompilerConfig::default().with_allowed_ddl(vec![DdlKind::Drop]);
    let ctx = run_pipeline("DROP TABLE t", &permissive);
    assert!(!ctx.has_errors());
}

#[test]
fn test_create_table_allowed_by_default() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("CREATE TABLE t (id INT)", &config);
    assert!(!ctx.has_errors());
    assert_eq!(
        ctx.metadata().get("statement_category"),
        Some(&serde_json::json!("ddl"))
    );
}

#[test]
fn test_mixed_styles_rejected() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = ? AND b = :b",
        &config,
        ParameterBinding::mixed([1i64], [("b", 2i64)]),
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "mixed_parameter_styles")
        .expect("finding present");
    assert_eq!(finding.risk, RiskLevel::Critical);
}

#[test]
fn test_mixed_styles_allowed_when_permitted() {
    let config = CompilerConfig::default().with_profile(
        sqlprep_core::ParameterProfile::ansi().with_allow_mixed(true),
    );
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = ? AND b = :b",
        &config,
        ParameterBinding::mixed([1i64], [("b", 2i64)]),
    );
    assert!(!ctx.has_errors());
}

#[test]
fn test_disallowed_style_for_dialect() {
    let config = CompilerConfig::for_dialect(SqlDialect::PostgreSql);
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = @a",
        &config,
        ParameterBinding::named([("a", 1i64)]),
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "parameter_style_not_allowed")
        .expect("finding present");
    assert!(finding.message.contains("at_named"));
}

#[test]
fn test_missing_named_parameter_strict() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = :a",
        &config,
        ParameterBinding::None,
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "parameter_mismatch")
        .expect("finding present");
    assert_eq!(finding.risk, RiskLevel::Critical);
    assert!(ctx.has_errors());
}

#[test]
fn test_missing_parameter_lenient_is_not_blocking() {
    let config = CompilerConfig::default().with_strict_parameters(false);
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = :a",
        &config,
        ParameterBinding::None,
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "parameter_mismatch")
        .expect("finding present");
    assert_eq!(finding.risk, RiskLevel::Medium);
    assert!(!ctx.has_errors());
}

#[test]
fn test_extra_parameters_are_low_risk() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = ?",
        &config,
        ParameterBinding::positional([1i64, 2i64, 3i64]),
    );
    let finding = ctx
        .findings()
        .iter()
        .find(|f| f.code == "unused_parameters")
        .expect("finding present");
    assert_eq!(finding.risk, RiskLevel::Low);
    assert!(!ctx.has_errors());
}

#[test]
fn test_transformers_skipped_after_blocking_finding() {
    let config = CompilerConfig::default().with_simplify(true);
    let ctx = run_pipeline("DELETE FROM t", &config);
    assert!(ctx.has_errors());
    assert!(ctx.transformations().is_empty());
    // The analyzer never ran either.
    assert!(!ctx.metadata().contains_key("statement_category"));
}

#[test]
fn test_comment_stripping_records_transformation() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline(
        "SELECT * FROM t /* a comment */ WHERE id = 1 -- trailing",
        &config,
    );
    assert!(!ctx.has_errors());
    assert_eq!(
        ctx.metadata().get("comments_removed"),
        Some(&serde_json::json!(2))
    );
    let record = &ctx.transformations()[0];
    assert_eq!(record.processor, "comment_stripper");
    assert!(record.before.contains("a comment"));
    assert!(!record.after.contains("a comment"));
}

#[test]
fn test_optimizer_hint_preserved() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("SELECT /*+ INDEX(t idx_a) */ * FROM t", &config);
    assert_eq!(ctx.hints(), &["/*+ INDEX(t idx_a) */".to_string()]);
    assert_eq!(
        ctx.metadata().get("hints_preserved"),
        Some(&serde_json::json!(1))
    );
}

#[test]
fn test_hint_dropped_when_removal_requested() {
    let mut config = CompilerConfig::default();
    config.remove_hints = true;
    let ctx = run_pipeline("SELECT /*+ INDEX(t idx_a) */ * FROM t", &config);
    assert!(ctx.hints().is_empty());
}

#[test]
fn test_plain_comment_is_not_a_hint() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline("SELECT /* just words */ * FROM t", &config);
    assert!(ctx.hints().is_empty());
}

#[test]
fn test_literal_promotion() {
    let config = CompilerConfig::default().with_promote_literals(true);
    let ctx = run_pipeline("SELECT * FROM t WHERE a = 5 AND b = 'x' AND c = TRUE", &config);
    assert!(!ctx.has_errors());
    assert_eq!(ctx.promoted().len(), 3);
    assert_eq!(ctx.promoted()[0].name, "p0");
    assert_eq!(
        ctx.promoted()[0].inferred,
        sqlprep_core::InferredType::Integer
    );
    assert_eq!(
        ctx.promoted()[1].inferred,
        sqlprep_core::InferredType::String
    );
    assert_eq!(
        ctx.promoted()[2].inferred,
        sqlprep_core::InferredType::Boolean
    );
    // The statement now carries placeholders where the literals were.
    let rendered = ctx.statement().expect("statement present").to_string();
    assert!(rendered.contains("$1"));
    assert!(rendered.contains("$3"));
    assert!(!rendered.contains('5'));
    assert_eq!(
        ctx.metadata().get("literals_promoted"),
        Some(&serde_json::json!(3))
    );
}

#[test]
fn test_literal_promotion_skips_limit() {
    let config = CompilerConfig::default().with_promote_literals(true);
    let ctx = run_pipeline("SELECT * FROM t WHERE a = 5 LIMIT 10", &config);
    assert_eq!(ctx.promoted().len(), 1);
    let rendered = ctx.statement().expect("statement present").to_string();
    assert!(rendered.contains("LIMIT 10"));
}

#[test]
fn test_literal_promotion_numbers_after_existing_placeholders() {
    let config = CompilerConfig::default().with_promote_literals(true);
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = ? AND b = 5",
        &config,
        ParameterBinding::positional([1i64]),
    );
    assert_eq!(ctx.promoted().len(), 1);
    let rendered = ctx.statement().expect("statement present").to_string();
    // The user placeholder holds slot 1; the promoted literal takes slot 2.
    assert!(rendered.contains("$1"));
    assert!(rendered.contains("$2"));
}

#[test]
fn test_simplifier_folds_boolean_identities() {
    let config = CompilerConfig::default().with_simplify(true);
    let ctx = run_pipeline("SELECT * FROM t WHERE 1 = 1 AND a = 2", &config);
    assert!(!ctx.has_errors());
    let rendered = ctx.statement().expect("statement present").to_string();
    assert!(!rendered.contains("1 = 1"));
    assert!(rendered.contains("a = 2"));
    let record = ctx
        .transformations()
        .iter()
        .find(|r| r.processor == "simplifier")
        .expect("diagnostic recorded");
    assert!(record.before.len() > record.after.len());
    assert!(ctx.metadata().contains_key("simplifier_chars_saved"));
}

#[test]
fn test_simplifier_records_nothing_when_unchanged() {
    let config = CompilerConfig::default().with_simplify(true);
    let ctx = run_pipeline("SELECT * FROM t WHERE a = 2", &config);
    assert!(
        ctx.transformations()
            .iter()
            .all(|r| r.processor != "simplifier")
    );
}

#[test]
fn test_analyzer_records_metadata() {
    let config = CompilerConfig::default();
    let ctx = run_pipeline_with(
        "SELECT * FROM t WHERE a = ?",
        &config,
        ParameterBinding::positional([1i64]),
    );
    assert_eq!(
        ctx.metadata().get("statement_category"),
        Some(&serde_json::json!("dql"))
    );
    assert_eq!(
        ctx.metadata().get("placeholder_count"),
        Some(&serde_json::json!(1))
    );
}
