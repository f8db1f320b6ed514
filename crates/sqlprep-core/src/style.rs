//! Parameter placeholder styles
//!
//! A parameter style is the lexical syntax a database dialect uses to mark a
//! substitutable value inside SQL text. Styles are detected from the text
//! alone; which styles a dialect accepts is declared by its
//! [`ParameterProfile`](crate::ParameterProfile).

use crate::SqlprepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The placeholder syntax used by a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStyle {
    /// Question mark positional parameters (`?`) - JDBC, MySQL, SQLite
    QuestionMark,
    /// Dollar-numbered positional parameters (`$1`, `$2`) - PostgreSQL
    Numeric,
    /// Colon-prefixed named parameters (`:name`) - Oracle, SQLite
    ColonNamed,
    /// Colon-prefixed positional parameters (`:1`, `:2`, digits only)
    ColonPositional,
    /// At-sign-prefixed named parameters (`@name`) - SQL Server
    AtNamed,
    /// Dollar-sign-prefixed named parameters (`$name`, non-numeric)
    DollarNamed,
    /// Python-DBAPI named parameters (`%(name)s`)
    PyformatNamed,
    /// Python-DBAPI positional parameters (`%s`)
    PyformatPositional,
    /// No placeholders - the statement is static text
    Static,
}

impl ParameterStyle {
    /// Returns true if placeholders of this style carry a name.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Self::ColonNamed | Self::AtNamed | Self::DollarNamed | Self::PyformatNamed
        )
    }

    /// Returns true if placeholders of this style are positional.
    pub fn is_positional(&self) -> bool {
        matches!(
            self,
            Self::QuestionMark
                | Self::Numeric
                | Self::ColonPositional
                | Self::PyformatPositional
        )
    }

    /// Returns true if a placeholder of this style can appear more than once
    /// while referring to a single bound value (`$1 .. $1`, `:id .. :id`).
    ///
    /// Anonymous styles (`?`, `%s`) bind one value per occurrence instead.
    pub fn reuses_slots(&self) -> bool {
        !matches!(self, Self::QuestionMark | Self::PyformatPositional | Self::Static)
    }

    /// Returns the style as a stable snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionMark => "question_mark",
            Self::Numeric => "numeric",
            Self::ColonNamed => "colon_named",
            Self::ColonPositional => "colon_positional",
            Self::AtNamed => "at_named",
            Self::DollarNamed => "dollar_named",
            Self::PyformatNamed => "pyformat_named",
            Self::PyformatPositional => "pyformat_positional",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterStyle {
    type Err = SqlprepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question_mark" | "qmark" => Ok(Self::QuestionMark),
            "numeric" => Ok(Self::Numeric),
            "colon_named" | "named_colon" => Ok(Self::ColonNamed),
            "colon_positional" | "positional_colon" => Ok(Self::ColonPositional),
            "at_named" | "named_at" => Ok(Self::AtNamed),
            "dollar_named" | "named_dollar" => Ok(Self::DollarNamed),
            "pyformat_named" | "named_pyformat" => Ok(Self::PyformatNamed),
            "pyformat_positional" | "positional_pyformat" => Ok(Self::PyformatPositional),
            "static" | "none" => Ok(Self::Static),
            other => Err(SqlprepError::UnknownStyle(other.to_string())),
        }
    }
}
