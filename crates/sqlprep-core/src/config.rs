//! Compiler configuration
//!
//! All knobs the statement compiler honors. The struct is serde-friendly so
//! embedding applications can load it from their own settings files; the
//! core itself never touches the filesystem.

use crate::{ParameterProfile, SqlDialect};
use serde::{Deserialize, Serialize};

/// Categories of DDL statements for the allow-list check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DdlKind {
    /// CREATE TABLE/VIEW/INDEX/SCHEMA
    Create,
    /// ALTER TABLE and friends
    Alter,
    /// RENAME TABLE
    Rename,
    /// DROP of any object
    Drop,
    /// TRUNCATE TABLE
    Truncate,
}

impl DdlKind {
    /// Returns the kind as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Alter => "alter",
            Self::Rename => "rename",
            Self::Drop => "drop",
            Self::Truncate => "truncate",
        }
    }
}

/// Configuration for the statement compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Target dialect; drives parsing and the default parameter profile
    pub dialect: SqlDialect,
    /// Override of the dialect's parameter profile
    pub profile: Option<ParameterProfile>,
    /// Fail the compile on parameter-count/name mismatches instead of
    /// recording a finding
    pub strict_parameters: bool,
    /// Flag UPDATE/DELETE statements lacking a WHERE clause
    pub enforce_where: bool,
    /// Treat high-risk findings as fatal, not just critical ones
    pub strict_safety: bool,
    /// DDL categories the compiler accepts; anything else is critical
    pub allowed_ddl: Vec<DdlKind>,
    /// Strip comments from the statement text
    pub strip_comments: bool,
    /// Also strip optimizer hints (`/*+ ... */`); off by default so hints
    /// survive comment stripping
    pub remove_hints: bool,
    /// Replace literals with synthetic parameters so shape-identical
    /// statements share a cache entry
    pub promote_literals: bool,
    /// Run the constant-folding/boolean-simplification pass
    pub simplify: bool,
    /// Bound of the compiled-statement cache
    pub cache_capacity: usize,
    /// Bound of the tokenizer's per-instance extraction cache
    pub tokenizer_cache_capacity: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            profile: None,
            strict_parameters: true,
            enforce_where: true,
            strict_safety: true,
            allowed_ddl: vec![DdlKind::Create, DdlKind::Alter],
            strip_comments: true,
            remove_hints: false,
            promote_literals: false,
            simplify: false,
            cache_capacity: 128,
            tokenizer_cache_capacity: 512,
        }
    }
}

impl CompilerConfig {
    /// Default configuration for a dialect
    pub fn for_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// The profile in effect: the explicit override if set, else the
    /// dialect's own.
    pub fn effective_profile(&self) -> ParameterProfile {
        self.profile.clone().unwrap_or_else(|| self.dialect.profile())
    }

    /// Whether a DDL category is allow-listed
    pub fn ddl_allowed(&self, kind: DdlKind) -> bool {
        self.allowed_ddl.contains(&kind)
    }

    /// Builder-style profile override
    pub fn with_profile(mut self, profile: ParameterProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Builder-style strictness override for parameter mismatches
    pub fn with_strict_parameters(mut self, strict: bool) -> Self {
        self.strict_parameters = strict;
        self
    }

    /// Builder-style toggle for the WHERE-clause requirement
    pub fn with_enforce_where(mut self, enforce: bool) -> Self {
        self.enforce_where = enforce;
        self
    }

    /// Builder-style DDL allow-list override
    pub fn with_allowed_ddl(mut self, kinds: Vec<DdlKind>) -> Self {
        self.allowed_ddl = kinds;
        self
    }

    /// Builder-style toggle for literal promotion
    pub fn with_promote_literals(mut self, promote: bool) -> Self {
        self.promote_literals = promote;
        self
    }

    /// Builder-style toggle for the simplifier
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Builder-style cache bound override
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
