//! Parameter style conversion
//!
//! Conversion builds the output by copying source text between placeholder
//! spans and substituting a freshly rendered placeholder for each, in one
//! left-to-right pass. It is never a blind text replace: two identical `?`
//! tokens map to different outputs (`$1`, `$2`) because identity comes from
//! position, not content.
//!
//! The converter also owns the parse-enabling canonicalization step: before
//! the statement is handed to the SQL parser, every placeholder is rewritten
//! to the numbered `$N` form, the one placeholder token the parser treats
//! uniformly under every supported dialect. The ordinal-indexed
//! [`ParameterInfo`] list is the reversible map back to each placeholder's
//! original style and name.

use super::{ParameterBinding, ParameterInfo, ShapedParameters};
use indexmap::IndexMap;
use regex::Regex;
use sqlprep_core::{ParameterStyle, TypedParameter, Value};
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur during conversion and payload shaping.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    /// A required named parameter was not provided.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A required numbered parameter was not provided.
    #[error("missing positional parameter at index {0}")]
    MissingPosition(usize),

    /// Fewer positional values than anonymous placeholders.
    #[error("expected at least {expected} positional parameters, got {actual}")]
    NotEnoughValues { expected: usize, actual: usize },

    /// The static style cannot carry placeholders.
    #[error("cannot render placeholders in the static style")]
    StaticTarget,

    /// A canonical `$N` token points past every known placeholder.
    #[error("canonical slot {0} has no source placeholder")]
    UnknownSlot(usize),
}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// SQL text with every placeholder rewritten to the parser-uniform `$N`
/// form, ready for the AST parser.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSql {
    /// The rewritten SQL text
    pub sql: String,
    /// How many placeholders were rewritten
    pub placeholder_count: usize,
}

// Canonical text re-scan: strings and comments are skipped so `$N` inside a
// rendered literal is never treated as a slot reference.
static CANON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)"#,
        r#"(?:"(?:[^"\\]|\\.)*")"#,
        r#"|(?:'(?:[^'\\]|\\.|'')*')"#,
        r#"|(?:--[^\n]*)"#,
        r#"|(?:/\*.*?\*/)"#,
        r#"|\$(?P<slot>\d+)"#,
    ))
    .expect("valid canonical scan pattern")
});

/// Where an output placeholder's identity and value come from.
#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    /// A placeholder the user wrote, with its detected info
    Param(&'a ParameterInfo),
    /// A parameter synthesized from a promoted literal
    Promoted(&'a TypedParameter),
}

/// One placeholder occurrence in the text being rewritten.
#[derive(Debug, Clone)]
struct Occurrence<'a> {
    range: Range<usize>,
    source: Source<'a>,
    /// Index among anonymous (`?`, `%s`) placeholders, used to pick the
    /// matching positional value
    anon_index: Option<usize>,
}

/// Identity of a bind slot: named placeholders collapse by name, numbered
/// ones by their explicit index, anonymous ones stay one slot per
/// occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SlotKey {
    Name(String),
    Index(usize),
    Anon(usize),
}

#[derive(Debug, Clone)]
struct AssignedSlot {
    number: usize,
    name: String,
}

/// Assigns output slot numbers and names in first-appearance order,
/// collapsing repeated occurrences of the same slot key.
struct SlotAssigner {
    slots: IndexMap<SlotKey, AssignedSlot>,
}

impl SlotAssigner {
    fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    fn assign(&mut self, occ: &Occurrence<'_>) -> (AssignedSlot, bool) {
        let key = slot_key(occ);
        if let Some(existing) = self.slots.get(&key) {
            return (existing.clone(), false);
        }
        let number = self.slots.len() + 1;
        let name = match occ.source {
            Source::Param(info) => info
                .name
                .clone()
                .unwrap_or_else(|| format!("param_{}", info.ordinal)),
            Source::Promoted(p) => p.name.clone(),
        };
        let slot = AssignedSlot { number, name };
        self.slots.insert(key, slot.clone());
        (slot, true)
    }
}

fn slot_key(occ: &Occurrence<'_>) -> SlotKey {
    match occ.source {
        Source::Param(info) => {
            if let Some(name) = &info.name {
                SlotKey::Name(name.clone())
            } else if let Some(index) = info.explicit_index() {
                SlotKey::Index(index)
            } else {
                SlotKey::Anon(info.ordinal)
            }
        }
        Source::Promoted(p) => SlotKey::Name(p.name.clone()),
    }
}

/// Anonymous-placeholder index per ordinal: the Nth `?`/`%s` consumes the
/// Nth positional value even when named placeholders sit in between.
fn anon_indices(infos: &[ParameterInfo]) -> Vec<Option<usize>> {
    let mut next = 0usize;
    infos
        .iter()
        .map(|info| {
            if info.name.is_none() && info.explicit_index().is_none() {
                let index = next;
                next += 1;
                Some(index)
            } else {
                None
            }
        })
        .collect()
}

fn occurrences_from_infos(infos: &[ParameterInfo]) -> Vec<Occurrence<'_>> {
    let anon = anon_indices(infos);
    infos
        .iter()
        .map(|info| Occurrence {
            range: info.span(),
            source: Source::Param(info),
            anon_index: anon[info.ordinal],
        })
        .collect()
}

fn occurrences_from_canonical<'a>(
    canonical_sql: &str,
    infos: &'a [ParameterInfo],
    promoted: &'a [TypedParameter],
) -> ConvertResult<Vec<Occurrence<'a>>> {
    let anon = anon_indices(infos);
    let mut occurrences = Vec::new();
    for caps in CANON_RE.captures_iter(canonical_sql) {
        let Some(slot) = caps.name("slot") else {
            continue;
        };
        let number: usize = slot
            .as_str()
            .parse()
            .map_err(|_| ConvertError::UnknownSlot(0))?;
        let index = number
            .checked_sub(1)
            .ok_or(ConvertError::UnknownSlot(number))?;
        let whole = caps.get(0).expect("match has a root group");
        let (source, anon_index) = if index < infos.len() {
            (Source::Param(&infos[index]), anon[index])
        } else if index - infos.len() < promoted.len() {
            (Source::Promoted(&promoted[index - infos.len()]), None)
        } else {
            return Err(ConvertError::UnknownSlot(number));
        };
        occurrences.push(Occurrence {
            range: whole.range(),
            source,
            anon_index,
        });
    }
    Ok(occurrences)
}

fn value_of(occ: &Occurrence<'_>, binding: &ParameterBinding) -> ConvertResult<Value> {
    match occ.source {
        Source::Promoted(p) => Ok(p.value.clone()),
        Source::Param(info) => {
            if let Some(name) = &info.name {
                binding
                    .get_named(name)
                    .cloned()
                    .ok_or_else(|| ConvertError::MissingParameter(name.clone()))
            } else if let Some(index) = info.explicit_index() {
                binding
                    .get_position(index - 1)
                    .cloned()
                    .ok_or(ConvertError::MissingPosition(index))
            } else {
                let index = occ.anon_index.unwrap_or(info.ordinal);
                binding.get_position(index).cloned().ok_or_else(|| {
                    ConvertError::NotEnoughValues {
                        expected: index + 1,
                        actual: binding.positional_values().len(),
                    }
                })
            }
        }
    }
}

fn render_occurrences(
    sql: &str,
    occurrences: &[Occurrence<'_>],
    target: ParameterStyle,
) -> ConvertResult<String> {
    if target == ParameterStyle::Static {
        if occurrences.is_empty() {
            return Ok(sql.to_string());
        }
        return Err(ConvertError::StaticTarget);
    }

    let mut assigner = SlotAssigner::new();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0usize;

    for occ in occurrences {
        out.push_str(&sql[last..occ.range.start]);
        let token = match target {
            ParameterStyle::QuestionMark => "?".to_string(),
            ParameterStyle::PyformatPositional => "%s".to_string(),
            _ => {
                let (slot, _) = assigner.assign(occ);
                match target {
                    ParameterStyle::Numeric => format!("${}", slot.number),
                    ParameterStyle::ColonPositional => format!(":{}", slot.number),
                    ParameterStyle::ColonNamed => format!(":{}", slot.name),
                    ParameterStyle::AtNamed => format!("@{}", slot.name),
                    ParameterStyle::DollarNamed => format!("${}", slot.name),
                    ParameterStyle::PyformatNamed => format!("%({})s", slot.name),
                    ParameterStyle::QuestionMark
                    | ParameterStyle::PyformatPositional
                    | ParameterStyle::Static => unreachable!("handled above"),
                }
            }
        };
        out.push_str(&token);
        last = occ.range.end;
    }
    out.push_str(&sql[last..]);
    Ok(out)
}

fn shape_occurrences(
    occurrences: &[Occurrence<'_>],
    binding: &ParameterBinding,
    target: ParameterStyle,
) -> ConvertResult<ShapedParameters> {
    match target {
        ParameterStyle::Static => {
            if occurrences.is_empty() {
                Ok(ShapedParameters::Positional(Vec::new()))
            } else {
                Err(ConvertError::StaticTarget)
            }
        }
        // Anonymous targets cannot express slot reuse: one value per
        // occurrence, duplicating as needed.
        ParameterStyle::QuestionMark | ParameterStyle::PyformatPositional => {
            let mut values = Vec::with_capacity(occurrences.len());
            for occ in occurrences {
                values.push(value_of(occ, binding)?);
            }
            Ok(ShapedParameters::Positional(values))
        }
        ParameterStyle::Numeric | ParameterStyle::ColonPositional => {
            let mut assigner = SlotAssigner::new();
            let mut values = Vec::new();
            for occ in occurrences {
                let (_, fresh) = assigner.assign(occ);
                if fresh {
                    values.push(value_of(occ, binding)?);
                }
            }
            Ok(ShapedParameters::Positional(values))
        }
        ParameterStyle::ColonNamed
        | ParameterStyle::AtNamed
        | ParameterStyle::DollarNamed
        | ParameterStyle::PyformatNamed => {
            let mut assigner = SlotAssigner::new();
            let mut named = IndexMap::new();
            for occ in occurrences {
                let (slot, fresh) = assigner.assign(occ);
                if fresh {
                    named.insert(slot.name, value_of(occ, binding)?);
                }
            }
            Ok(ShapedParameters::Named(named))
        }
    }
}

/// Rewrites placeholder syntax between styles, preserving ordinal and name
/// identity.
pub struct ParameterStyleConverter;

impl ParameterStyleConverter {
    /// Rewrite `sql` so its placeholders use `target` style.
    ///
    /// Named targets preserve original names when known and synthesize
    /// `param_<ordinal>` otherwise.
    pub fn convert(
        sql: &str,
        infos: &[ParameterInfo],
        target: ParameterStyle,
    ) -> ConvertResult<String> {
        let occurrences = occurrences_from_infos(infos);
        render_occurrences(sql, &occurrences, target)
    }

    /// Shape supplied values into the payload `target` expects, aligned
    /// with the placeholders [`convert`](Self::convert) renders.
    pub fn shape(
        infos: &[ParameterInfo],
        binding: &ParameterBinding,
        target: ParameterStyle,
    ) -> ConvertResult<ShapedParameters> {
        let occurrences = occurrences_from_infos(infos);
        shape_occurrences(&occurrences, binding, target)
    }

    /// Rewrite every placeholder to the parser-uniform `$N` form, `N` being
    /// the placeholder's one-based ordinal. This always precedes parsing and
    /// is distinct from any user-requested conversion.
    pub fn canonicalize(sql: &str, infos: &[ParameterInfo]) -> CanonicalSql {
        let mut out = String::with_capacity(sql.len());
        let mut last = 0usize;
        for info in infos {
            out.push_str(&sql[last..info.position]);
            out.push_str(&format!("${}", info.ordinal + 1));
            last = info.position + info.text.len();
        }
        out.push_str(&sql[last..]);
        CanonicalSql {
            sql: out,
            placeholder_count: infos.len(),
        }
    }

    /// Render canonical (`$N`) text into `target` style, restoring each
    /// placeholder's original identity through `infos` and `promoted`.
    pub(crate) fn render_canonical(
        canonical_sql: &str,
        infos: &[ParameterInfo],
        promoted: &[TypedParameter],
        target: ParameterStyle,
    ) -> ConvertResult<String> {
        let occurrences = occurrences_from_canonical(canonical_sql, infos, promoted)?;
        render_occurrences(canonical_sql, &occurrences, target)
    }

    /// Shape values for canonical text rendered via
    /// [`render_canonical`](Self::render_canonical).
    pub(crate) fn shape_canonical(
        canonical_sql: &str,
        infos: &[ParameterInfo],
        promoted: &[TypedParameter],
        binding: &ParameterBinding,
        target: ParameterStyle,
    ) -> ConvertResult<ShapedParameters> {
        let occurrences = occurrences_from_canonical(canonical_sql, infos, promoted)?;
        shape_occurrences(&occurrences, binding, target)
    }
}
