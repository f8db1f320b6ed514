//! Tests for parameter detection, conversion, and shaping

use super::converter::{CanonicalSql, ConvertError, ParameterStyleConverter};
use super::tokenizer::{ParameterTokenizer, detected_style, detected_styles};
use super::{ParameterBinding, ShapedParameters};
use pretty_assertions::assert_eq;
use sqlprep_core::{ParameterStyle, Value};

fn extract(sql: &str) -> Vec<super::ParameterInfo> {
    ParameterTokenizer::default().extract(sql).as_ref().clone()
}

#[test]
fn test_extract_colon_named() {
    let params = extract("SELECT * FROM users WHERE id = :id AND name = :name");
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].style, ParameterStyle::ColonNamed);
    assert_eq!(params[0].name.as_deref(), Some("id"));
    assert_eq!(params[1].name.as_deref(), Some("name"));
    assert_eq!(params[0].ordinal, 0);
    assert_eq!(params[1].ordinal, 1);
}

#[test]
fn test_extract_question_mark() {
    let params = extract("SELECT * FROM t WHERE a = ? AND b = ?");
    assert_eq!(params.len(), 2);
    assert!(params.iter().all(|p| p.style == ParameterStyle::QuestionMark));
    assert_eq!(params[0].text, "?");
}

#[test]
fn test_extract_numeric_and_dollar_named() {
    let params = extract("SELECT * FROM t WHERE a = $1 AND b = $tag");
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].style, ParameterStyle::Numeric);
    assert_eq!(params[0].explicit_index(), Some(1));
    assert_eq!(params[1].style, ParameterStyle::DollarNamed);
    assert_eq!(params[1].name.as_deref(), Some("tag"));
}

#[test]
fn test_extract_at_named_and_colon_positional() {
    let params = extract("SELECT * FROM t WHERE a = @a AND b = :2");
    assert_eq!(params[0].style, ParameterStyle::AtNamed);
    assert_eq!(params[1].style, ParameterStyle::ColonPositional);
    assert_eq!(params[1].explicit_index(), Some(2));
}

#[test]
fn test_extract_pyformat() {
    let params = extract("SELECT * FROM t WHERE a = %(a)s AND b = %s");
    assert_eq!(params[0].style, ParameterStyle::PyformatNamed);
    assert_eq!(params[0].name.as_deref(), Some("a"));
    assert_eq!(params[1].style, ParameterStyle::PyformatPositional);
}

#[test]
fn test_exact_count_with_no_decoys() {
    let params = extract("INSERT INTO t (a, b, c) VALUES (?, ?, ?)");
    assert_eq!(params.len(), 3);
}

#[test]
fn test_repeated_tokenization_is_deterministic() {
    let sql = "SELECT * FROM t WHERE a = :a AND b = ? AND c = $3";
    let first = extract(sql);
    let second = extract(sql);
    assert_eq!(first, second);
}

#[test]
fn test_placeholder_in_string_literal_ignored() {
    let params = extract("SELECT * FROM t WHERE name = ':fake' AND id = :id");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name.as_deref(), Some("id"));
}

#[test]
fn test_placeholder_in_line_comment_ignored() {
    let params = extract("SELECT * FROM t WHERE id = ? -- ignore this ? and :that");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].style, ParameterStyle::QuestionMark);
}

#[test]
fn test_placeholder_in_block_comment_ignored() {
    let params = extract("SELECT * /* :fake $1 ? */ FROM t WHERE id = :id");
    assert_eq!(params.len(), 1);
}

#[test]
fn test_placeholder_in_dollar_quoted_string_ignored() {
    let params = extract("SELECT $$ :fake ? $$ FROM t WHERE id = $1");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].style, ParameterStyle::Numeric);

    let params = extract("SELECT $fn$ body :x $fn$ FROM t WHERE id = ?");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].style, ParameterStyle::QuestionMark);
}

#[test]
fn test_cast_is_not_a_colon_parameter() {
    let params = extract("SELECT price::numeric FROM t WHERE id = :id");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name.as_deref(), Some("id"));
}

#[test]
fn test_json_operators_are_not_qmark_parameters() {
    let params = extract("SELECT data ?? 'k', data ?| ARRAY['a'], data ?& ARRAY['b'] FROM t WHERE id = ?");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].style, ParameterStyle::QuestionMark);
}

#[test]
fn test_system_variable_is_not_at_parameter() {
    let params = extract("SELECT @@version");
    assert!(params.is_empty());
}

#[test]
fn test_percent_escape_is_not_pyformat() {
    let params = extract("SELECT '100%' FROM t WHERE a %% b = %s");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].style, ParameterStyle::PyformatPositional);
}

#[test]
fn test_style_detection() {
    let infos = extract("SELECT * FROM t WHERE a = :a AND b = :b");
    assert_eq!(detected_style(&infos), Some(ParameterStyle::ColonNamed));

    let infos = extract("SELECT * FROM t WHERE a = :a AND b = ?");
    assert_eq!(detected_style(&infos), None);
    assert_eq!(
        detected_styles(&infos),
        vec![ParameterStyle::ColonNamed, ParameterStyle::QuestionMark]
    );

    let infos = extract("SELECT 1");
    assert_eq!(detected_style(&infos), None);
    assert!(detected_styles(&infos).is_empty());
}

#[test]
fn test_tokenizer_memoizes_and_clears() {
    let tokenizer = ParameterTokenizer::new(8);
    let sql = "SELECT * FROM t WHERE id = ?";
    let first = tokenizer.extract(sql);
    let second = tokenizer.extract(sql);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(tokenizer.cached_len(), 1);

    tokenizer.clear();
    assert_eq!(tokenizer.cached_len(), 0);
}

#[test]
fn test_tokenizer_cache_is_bounded() {
    let tokenizer = ParameterTokenizer::new(2);
    tokenizer.extract("SELECT 1");
    tokenizer.extract("SELECT 2");
    tokenizer.extract("SELECT 3");
    assert_eq!(tokenizer.cached_len(), 2);
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

#[test]
fn test_convert_qmark_to_numeric_is_position_based() {
    let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
    let infos = extract(sql);
    let converted = ParameterStyleConverter::convert(sql, &infos, ParameterStyle::Numeric).unwrap();
    assert_eq!(converted, "SELECT * FROM t WHERE a = $1 AND b = $2");
}

#[test]
fn test_convert_named_to_qmark() {
    let sql = "SELECT * FROM users WHERE id = :id";
    let infos = extract(sql);
    let converted =
        ParameterStyleConverter::convert(sql, &infos, ParameterStyle::QuestionMark).unwrap();
    assert_eq!(converted, "SELECT * FROM users WHERE id = ?");
}

#[test]
fn test_convert_preserves_names() {
    let sql = "SELECT * FROM t WHERE a = :alpha AND b = :beta";
    let infos = extract(sql);
    let converted = ParameterStyleConverter::convert(sql, &infos, ParameterStyle::AtNamed).unwrap();
    assert_eq!(converted, "SELECT * FROM t WHERE a = @alpha AND b = @beta");

    let converted =
        ParameterStyleConverter::convert(sql, &infos, ParameterStyle::PyformatNamed).unwrap();
    assert_eq!(converted, "SELECT * FROM t WHERE a = %(alpha)s AND b = %(beta)s");
}

#[test]
fn test_convert_synthesizes_names_for_anonymous_placeholders() {
    let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
    let infos = extract(sql);
    let converted =
        ParameterStyleConverter::convert(sql, &infos, ParameterStyle::ColonNamed).unwrap();
    assert_eq!(converted, "SELECT * FROM t WHERE a = :param_0 AND b = :param_1");
}

#[test]
fn test_convert_repeated_name_reuses_slot_number() {
    let sql = "SELECT * FROM t WHERE a = :id OR b = :id";
    let infos = extract(sql);
    let converted = ParameterStyleConverter::convert(sql, &infos, ParameterStyle::Numeric).unwrap();
    assert_eq!(converted, "SELECT * FROM t WHERE a = $1 OR b = $1");
}

#[test]
fn test_convert_roundtrip_positional() {
    let original = "SELECT * FROM t WHERE a = ? AND b = ?";
    let infos = extract(original);
    let numeric =
        ParameterStyleConverter::convert(original, &infos, ParameterStyle::Numeric).unwrap();
    let infos_numeric = extract(&numeric);
    assert_eq!(infos_numeric.len(), infos.len());
    let back = ParameterStyleConverter::convert(
        &numeric,
        &infos_numeric,
        ParameterStyle::QuestionMark,
    )
    .unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_convert_roundtrip_named() {
    let original = "SELECT * FROM t WHERE a = :id AND b = :name";
    let infos = extract(original);
    let at = ParameterStyleConverter::convert(original, &infos, ParameterStyle::AtNamed).unwrap();
    let infos_at = extract(&at);
    let back =
        ParameterStyleConverter::convert(&at, &infos_at, ParameterStyle::ColonNamed).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_convert_to_static_fails_with_placeholders() {
    let sql = "SELECT * FROM t WHERE a = ?";
    let infos = extract(sql);
    assert_eq!(
        ParameterStyleConverter::convert(sql, &infos, ParameterStyle::Static),
        Err(ConvertError::StaticTarget)
    );
}

#[test]
fn test_canonicalize_numbers_by_ordinal() {
    let sql = "SELECT * FROM t WHERE a = :a AND b = ? AND c = %(c)s";
    let infos = extract(sql);
    let CanonicalSql {
        sql: canonical,
        placeholder_count,
    } = ParameterStyleConverter::canonicalize(sql, &infos);
    assert_eq!(canonical, "SELECT * FROM t WHERE a = $1 AND b = $2 AND c = $3");
    assert_eq!(placeholder_count, 3);
}

// ---------------------------------------------------------------------------
// Shaping
// ---------------------------------------------------------------------------

#[test]
fn test_shape_named_source_for_positional_target() {
    let infos = extract("SELECT * FROM t WHERE a = :a AND b = :b");
    let binding = ParameterBinding::named([("a", 1i64), ("b", 2i64)]);
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark).unwrap();
    assert_eq!(
        shaped,
        ShapedParameters::Positional(vec![Value::Int64(1), Value::Int64(2)])
    );
}

#[test]
fn test_shape_duplicates_values_for_anonymous_target() {
    let infos = extract("SELECT * FROM t WHERE a = :id OR b = :id");
    let binding = ParameterBinding::named([("id", 7i64)]);
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark).unwrap();
    assert_eq!(
        shaped,
        ShapedParameters::Positional(vec![Value::Int64(7), Value::Int64(7)])
    );

    // A numbered target reuses the slot instead.
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::Numeric).unwrap();
    assert_eq!(shaped, ShapedParameters::Positional(vec![Value::Int64(7)]));
}

#[test]
fn test_shape_positional_source_for_named_target() {
    let infos = extract("SELECT * FROM t WHERE a = ? AND b = ?");
    let binding = ParameterBinding::positional([10i64, 20i64]);
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::ColonNamed).unwrap();
    let named = shaped.as_named().unwrap();
    assert_eq!(named.get("param_0"), Some(&Value::Int64(10)));
    assert_eq!(named.get("param_1"), Some(&Value::Int64(20)));
}

#[test]
fn test_shape_numeric_source_respects_explicit_indexes() {
    let infos = extract("SELECT * FROM t WHERE a = $2 AND b = $1");
    let binding = ParameterBinding::positional(["first", "second"]);
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark).unwrap();
    // $2 appears first in the text, so its value leads the payload.
    assert_eq!(
        shaped,
        ShapedParameters::Positional(vec![
            Value::String("second".to_string()),
            Value::String("first".to_string()),
        ])
    );
}

#[test]
fn test_shape_missing_named_value() {
    let infos = extract("SELECT * FROM t WHERE a = :a");
    let binding = ParameterBinding::named([("other", 1i64)]);
    assert_eq!(
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark),
        Err(ConvertError::MissingParameter("a".to_string()))
    );
}

#[test]
fn test_shape_not_enough_positional_values() {
    let infos = extract("SELECT * FROM t WHERE a = ? AND b = ?");
    let binding = ParameterBinding::positional([1i64]);
    assert_eq!(
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark),
        Err(ConvertError::NotEnoughValues {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn test_shape_mixed_binding() {
    let infos = extract("SELECT * FROM t WHERE a = :a AND b = ? AND c = ?");
    let binding = ParameterBinding::mixed([1i64, 2i64], [("a", "alpha")]);
    let shaped =
        ParameterStyleConverter::shape(&infos, &binding, ParameterStyle::QuestionMark).unwrap();
    assert_eq!(
        shaped,
        ShapedParameters::Positional(vec![
            Value::String("alpha".to_string()),
            Value::Int64(1),
            Value::Int64(2),
        ])
    );
}
