//! Transform-phase processors
//!
//! Transformers only run on a context with no blocking findings. Each one
//! records a [`TransformationRecord`](super::TransformationRecord) when, and
//! only when, the rendered SQL actually changed.

use super::{ProcessingContext, ProcessorError};
use regex::Regex;
use sqlparser::ast::{
    BinaryOperator, Expr, Offset, OrderBy, Statement, UnaryOperator, Value as AstValue,
    visit_expressions_mut,
};
use sqlprep_core::{InferredType, TypedParameter, Value};
use std::ops::ControlFlow;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Comment/hint stripper
// ---------------------------------------------------------------------------

// String literals are matched first so comment markers inside them are
// never treated as comments.
static COMMENT_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)"#,
        r#"(?:"(?:[^"\\]|\\.)*")"#,
        r#"|(?:'(?:[^'\\]|\\.|'')*')"#,
        r#"|(?:\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$.*?\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$)"#,
        r#"|(?P<line_comment>--[^\n]*)"#,
        r#"|(?P<block_comment>/\*.*?\*/)"#,
    ))
    .expect("valid comment scan pattern")
});

// Keywords that mark a block comment as an optimizer hint.
const HINT_KEYWORDS: &[&str] = &[
    "INDEX",
    "FULL",
    "PARALLEL",
    "APPEND",
    "USE_NL",
    "USE_HASH",
    "LEADING",
    "ORDERED",
    "MATERIALIZE",
    "NO_MERGE",
];

fn is_hint(comment: &str) -> bool {
    if comment.starts_with("/*+") {
        return true;
    }
    let upper = comment.to_uppercase();
    upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| HINT_KEYWORDS.contains(&word))
}

/// Remove comments from the statement text, extracting optimizer hints for
/// later re-injection unless hint removal was requested.
pub(super) fn strip_comments(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let original = ctx.sql().to_string();
    let remove_hints = ctx.config().remove_hints;

    let mut stripped = String::with_capacity(original.len());
    let mut hints: Vec<String> = Vec::new();
    let mut removed = 0usize;
    let mut last = 0usize;

    for caps in COMMENT_SCAN_RE.captures_iter(&original) {
        let is_line = caps.name("line_comment").is_some();
        let is_block = caps.name("block_comment").is_some();
        if !is_line && !is_block {
            continue;
        }
        let whole = caps.get(0).expect("match has a root group");
        stripped.push_str(&original[last..whole.start()]);
        let comment = whole.as_str();
        if is_block && !remove_hints && is_hint(comment) {
            hints.push(comment.to_string());
        }
        removed += 1;
        stripped.push(' ');
        last = whole.end();
    }
    stripped.push_str(&original[last..]);

    if removed > 0 {
        ctx.insert_metadata("comments_removed", serde_json::json!(removed));
        ctx.record_transformation("comment_stripper", original, stripped.trim_end());
    }
    if !hints.is_empty() {
        ctx.insert_metadata("hints_preserved", serde_json::json!(hints.len()));
        ctx.set_hints(hints);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Literal-to-parameter promoter
// ---------------------------------------------------------------------------

/// Replace literal values with synthetic parameters so that statements
/// differing only in literal values share one compiled form.
pub(super) fn promote_literals(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let Some(mut statement) = ctx.take_statement() else {
        return Ok(());
    };
    let base = ctx.parameters().len();
    let before = statement.to_string();

    let mut promoted: Vec<TypedParameter> = Vec::new();
    promote_in_statement(&mut statement, base, &mut promoted);

    if !promoted.is_empty() {
        let after = statement.to_string();
        ctx.insert_metadata("literals_promoted", serde_json::json!(promoted.len()));
        ctx.record_transformation("literal_promoter", before, after);
        for parameter in promoted {
            ctx.push_promoted(parameter);
        }
    }
    ctx.set_statement(statement);
    Ok(())
}

// LIMIT/OFFSET and ORDER BY stay literal: `LIMIT 10` as a parameter defeats
// plan caching on several databases and `ORDER BY 1` is a positional
// column reference, not a value.
struct DetachedClauses {
    limit: Option<Expr>,
    offset: Option<Offset>,
    order_by: Option<OrderBy>,
}

fn detach_non_promotable(statement: &mut Statement) -> DetachedClauses {
    match statement {
        Statement::Query(query) => DetachedClauses {
            limit: query.limit.take(),
            offset: query.offset.take(),
            order_by: query.order_by.take(),
        },
        Statement::Delete(delete) => DetachedClauses {
            limit: delete.limit.take(),
            offset: None,
            order_by: None,
        },
        _ => DetachedClauses {
            limit: None,
            offset: None,
            order_by: None,
        },
    }
}

fn reattach_clauses(statement: &mut Statement, detached: DetachedClauses) {
    match statement {
        Statement::Query(query) => {
            query.limit = detached.limit;
            query.offset = detached.offset;
            query.order_by = detached.order_by;
        }
        Statement::Delete(delete) => {
            delete.limit = detached.limit;
        }
        _ => {}
    }
}

fn promote_in_statement(
    statement: &mut Statement,
    base: usize,
    promoted: &mut Vec<TypedParameter>,
) {
    let detached = detach_non_promotable(statement);
    let _ = visit_expressions_mut(statement, |expr: &mut Expr| -> ControlFlow<()> {
        if let Expr::Value(value) = expr {
            if let Some((promoted_value, inferred)) = literal_value(value) {
                let slot = base + promoted.len() + 1;
                promoted.push(TypedParameter::new(
                    format!("p{}", promoted.len()),
                    promoted_value,
                    inferred,
                ));
                *expr = Expr::Value(AstValue::Placeholder(format!("${}", slot)));
            }
        }
        ControlFlow::Continue(())
    });
    reattach_clauses(statement, detached);
}

/// The promotable literal forms and their inferred semantic types.
fn literal_value(value: &AstValue) -> Option<(Value, InferredType)> {
    match value {
        AstValue::Number(text, _) => {
            if let Ok(int) = text.parse::<i64>() {
                Some((Value::Int64(int), InferredType::Integer))
            } else if let Ok(float) = text.parse::<f64>() {
                Some((Value::Float64(float), InferredType::Float))
            } else {
                Some((Value::Decimal(text.clone()), InferredType::Float))
            }
        }
        AstValue::SingleQuotedString(text) => {
            Some((Value::String(text.clone()), InferredType::String))
        }
        AstValue::Boolean(flag) => Some((Value::Bool(*flag), InferredType::Boolean)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Algebraic simplifier
// ---------------------------------------------------------------------------

/// Constant folding and boolean simplification over the statement's
/// expressions; records a diagnostic only when the rendered SQL changed.
pub(super) fn simplify(ctx: &mut ProcessingContext<'_>) -> Result<(), ProcessorError> {
    let Some(mut statement) = ctx.take_statement() else {
        return Ok(());
    };
    let before = statement.to_string();

    let mut changed = false;
    let _ = visit_expressions_mut(&mut statement, |expr: &mut Expr| -> ControlFlow<()> {
        changed |= fold_expr(expr);
        ControlFlow::Continue(())
    });

    if changed {
        let after = statement.to_string();
        if after != before {
            let saved = before.len() as i64 - after.len() as i64;
            ctx.insert_metadata("simplifier_chars_saved", serde_json::json!(saved));
            ctx.record_transformation("simplifier", before, after);
        }
    }
    ctx.set_statement(statement);
    Ok(())
}

/// Fold one expression subtree bottom-up. Returns whether anything changed.
fn fold_expr(expr: &mut Expr) -> bool {
    let mut changed = match expr {
        Expr::Nested(inner) => fold_expr(inner),
        Expr::UnaryOp { expr: inner, .. } => fold_expr(inner),
        Expr::BinaryOp { left, right, .. } => {
            let left_changed = fold_expr(left);
            let right_changed = fold_expr(right);
            left_changed || right_changed
        }
        _ => false,
    };
    if let Some(replacement) = simplified(expr) {
        *expr = replacement;
        changed = true;
    }
    changed
}

fn simplified(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Nested(inner) if matches!(inner.as_ref(), Expr::Value(_)) => {
            Some((**inner).clone())
        }
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => match inner.as_ref() {
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: inner_inner,
            } => Some((**inner_inner).clone()),
            other => bool_literal(other).map(|b| bool_expr(!b)),
        },
        Expr::BinaryOp { left, op, right } => {
            let left = left.as_ref();
            let right = right.as_ref();
            match op {
                BinaryOperator::And => {
                    if bool_literal(left) == Some(true) {
                        Some(right.clone())
                    } else if bool_literal(right) == Some(true) {
                        Some(left.clone())
                    } else if bool_literal(left) == Some(false)
                        || bool_literal(right) == Some(false)
                    {
                        Some(bool_expr(false))
                    } else {
                        None
                    }
                }
                BinaryOperator::Or => {
                    if bool_literal(left) == Some(false) {
                        Some(right.clone())
                    } else if bool_literal(right) == Some(false) {
                        Some(left.clone())
                    } else if bool_literal(left) == Some(true)
                        || bool_literal(right) == Some(true)
                    {
                        Some(bool_expr(true))
                    } else {
                        None
                    }
                }
                BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq => compare_literals(left, op, right).map(bool_expr),
                BinaryOperator::Plus | BinaryOperator::Minus | BinaryOperator::Multiply => {
                    fold_integer_arithmetic(left, op, right)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn bool_literal(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Value(AstValue::Boolean(b)) => Some(*b),
        _ => None,
    }
}

fn bool_expr(value: bool) -> Expr {
    Expr::Value(AstValue::Boolean(value))
}

fn number_literal(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Value(AstValue::Number(text, _)) => text.parse().ok(),
        _ => None,
    }
}

fn integer_literal(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Value(AstValue::Number(text, _)) => text.parse().ok(),
        _ => None,
    }
}

fn string_literal(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Value(AstValue::SingleQuotedString(text)) => Some(text),
        _ => None,
    }
}

fn compare_literals(left: &Expr, op: &BinaryOperator, right: &Expr) -> Option<bool> {
    if let (Some(a), Some(b)) = (number_literal(left), number_literal(right)) {
        return Some(match op {
            BinaryOperator::Eq => a == b,
            BinaryOperator::NotEq => a != b,
            BinaryOperator::Lt => a < b,
            BinaryOperator::LtEq => a <= b,
            BinaryOperator::Gt => a > b,
            BinaryOperator::GtEq => a >= b,
            _ => return None,
        });
    }
    if let (Some(a), Some(b)) = (string_literal(left), string_literal(right)) {
        return Some(match op {
            BinaryOperator::Eq => a == b,
            BinaryOperator::NotEq => a != b,
            BinaryOperator::Lt => a < b,
            BinaryOperator::LtEq => a <= b,
            BinaryOperator::Gt => a > b,
            BinaryOperator::GtEq => a >= b,
            _ => return None,
        });
    }
    None
}

fn fold_integer_arithmetic(left: &Expr, op: &BinaryOperator, right: &Expr) -> Option<Expr> {
    let a = integer_literal(left)?;
    let b = integer_literal(right)?;
    let folded = match op {
        BinaryOperator::Plus => a.checked_add(b)?,
        BinaryOperator::Minus => a.checked_sub(b)?,
        BinaryOperator::Multiply => a.checked_mul(b)?,
        _ => return None,
    };
    Some(Expr::Value(AstValue::Number(folded.to_string(), false)))
}
