//! Parameter input normalization and output shaping
//!
//! Callers hand the compiler positional sequences, named mappings, or a mix
//! of both; [`ParameterBinding`] is the one canonical representation the
//! rest of the engine works against. [`ShapedParameters`] is the outgoing
//! payload, shaped for whichever placeholder style the statement was
//! rendered in.

use indexmap::IndexMap;
use serde::Serialize;
use sqlprep_core::Value;
use std::collections::HashMap;

/// Canonical form of the parameters supplied with a compile call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParameterBinding {
    /// No parameters supplied
    #[default]
    None,
    /// Values bound by position
    Positional(Vec<Value>),
    /// Values bound by name, in insertion order
    Named(IndexMap<String, Value>),
    /// Both positional and named values in one call
    Mixed {
        positional: Vec<Value>,
        named: IndexMap<String, Value>,
    },
}

impl ParameterBinding {
    /// Build a positional binding
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Build a named binding
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a mixed binding
    pub fn mixed<I, J, K, V, W>(positional: I, named: J) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
        J: IntoIterator<Item = (K, W)>,
        K: Into<String>,
        W: Into<Value>,
    {
        Self::Mixed {
            positional: positional.into_iter().map(Into::into).collect(),
            named: named
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Whether no values were supplied at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Positional(values) => values.is_empty(),
            Self::Named(named) => named.is_empty(),
            Self::Mixed { positional, named } => positional.is_empty() && named.is_empty(),
        }
    }

    /// The positional values, if any
    pub fn positional_values(&self) -> &[Value] {
        match self {
            Self::Positional(values) => values,
            Self::Mixed { positional, .. } => positional,
            _ => &[],
        }
    }

    /// The named values, if any
    pub fn named_values(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Named(named) => Some(named),
            Self::Mixed { named, .. } => Some(named),
            _ => None,
        }
    }

    /// Look up a named value
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named_values().and_then(|named| named.get(name))
    }

    /// Look up a zero-based positional value
    pub fn get_position(&self, index: usize) -> Option<&Value> {
        self.positional_values().get(index)
    }
}

impl From<()> for ParameterBinding {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<Vec<Value>> for ParameterBinding {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<IndexMap<String, Value>> for ParameterBinding {
    fn from(named: IndexMap<String, Value>) -> Self {
        Self::Named(named)
    }
}

impl From<HashMap<String, Value>> for ParameterBinding {
    fn from(named: HashMap<String, Value>) -> Self {
        let mut pairs: Vec<(String, Value)> = named.into_iter().collect();
        // HashMap iteration order is arbitrary; sort for determinism.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self::Named(pairs.into_iter().collect())
    }
}

/// Parameter payload shaped for a target placeholder style: an ordered
/// sequence for positional styles, an ordered mapping for named styles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShapedParameters {
    /// Values in placeholder order
    Positional(Vec<Value>),
    /// Values keyed by placeholder name, in first-appearance order
    Named(IndexMap<String, Value>),
}

impl ShapedParameters {
    /// Number of values in the payload
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(named) => named.len(),
        }
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The payload as a positional slice, if it is one
    pub fn as_positional(&self) -> Option<&[Value]> {
        match self {
            Self::Positional(values) => Some(values),
            Self::Named(_) => None,
        }
    }

    /// The payload as a named mapping, if it is one
    pub fn as_named(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Named(named) => Some(named),
            Self::Positional(_) => None,
        }
    }
}
