//! SQL dialects and their parameter placeholder profiles
//!
//! Each dialect maps to a `sqlparser` dialect for parsing and to a
//! [`ParameterProfile`] declaring which placeholder styles it accepts,
//! which style it renders by default, and whether mixed styles are
//! tolerated. Profile metadata is explicit, not inferred.

use crate::{ParameterStyle, SqlprepError};
use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    AnsiDialect, ClickHouseDialect, Dialect, DuckDbDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect, SQLiteDialect,
};
use std::fmt;
use std::str::FromStr;

/// SQL dialect variants supported by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    /// PostgreSQL SQL dialect
    PostgreSql,
    /// MySQL/MariaDB SQL dialect
    MySql,
    /// SQLite SQL dialect
    Sqlite,
    /// Microsoft SQL Server dialect
    MsSql,
    /// DuckDB SQL dialect
    DuckDb,
    /// ClickHouse SQL dialect
    ClickHouse,
    /// Generic ANSI SQL (fallback)
    Ansi,
}

impl SqlDialect {
    /// Get the sqlparser dialect for this SQL variant
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::PostgreSql => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::MsSql => Box::new(MsSqlDialect {}),
            SqlDialect::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialect::ClickHouse => Box::new(ClickHouseDialect {}),
            SqlDialect::Ansi => Box::new(AnsiDialect {}),
        }
    }

    /// Stable identifier used in cache keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::PostgreSql => "postgresql",
            SqlDialect::MySql => "mysql",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MsSql => "mssql",
            SqlDialect::DuckDb => "duckdb",
            SqlDialect::ClickHouse => "clickhouse",
            SqlDialect::Ansi => "ansi",
        }
    }

    /// Get display name for this SQL dialect
    pub fn display_name(&self) -> &'static str {
        match self {
            SqlDialect::PostgreSql => "PostgreSQL",
            SqlDialect::MySql => "MySQL",
            SqlDialect::Sqlite => "SQLite",
            SqlDialect::MsSql => "SQL Server",
            SqlDialect::DuckDb => "DuckDB",
            SqlDialect::ClickHouse => "ClickHouse",
            SqlDialect::Ansi => "ANSI SQL",
        }
    }

    /// The default placeholder policy for this dialect
    pub fn profile(&self) -> ParameterProfile {
        match self {
            SqlDialect::PostgreSql => ParameterProfile::postgresql(),
            SqlDialect::MySql => ParameterProfile::mysql(),
            SqlDialect::Sqlite => ParameterProfile::sqlite(),
            SqlDialect::MsSql => ParameterProfile::mssql(),
            SqlDialect::DuckDb => ParameterProfile::duckdb(),
            SqlDialect::ClickHouse => ParameterProfile::clickhouse(),
            SqlDialect::Ansi => ParameterProfile::ansi(),
        }
    }
}

impl Default for SqlDialect {
    fn default() -> Self {
        SqlDialect::Ansi
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = SqlprepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::PostgreSql),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            "mssql" | "sqlserver" | "tsql" => Ok(SqlDialect::MsSql),
            "duckdb" => Ok(SqlDialect::DuckDb),
            "clickhouse" => Ok(SqlDialect::ClickHouse),
            "ansi" | "generic" => Ok(SqlDialect::Ansi),
            other => Err(SqlprepError::UnknownDialect(other.to_string())),
        }
    }
}

/// Placeholder policy a dialect declares: which styles it accepts as input,
/// which style it renders by default, and whether mixing styles in one
/// statement is tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterProfile {
    /// Style the compiler renders when no explicit target is requested
    pub default_style: ParameterStyle,
    /// Styles accepted in input SQL
    pub allowed_styles: Vec<ParameterStyle>,
    /// Whether one statement may mix placeholder styles
    pub allow_mixed: bool,
}

impl ParameterProfile {
    /// Create PostgreSQL-specific profile: renders `$1`, accepts the styles
    /// the common PostgreSQL client stacks produce.
    pub fn postgresql() -> Self {
        Self {
            default_style: ParameterStyle::Numeric,
            allowed_styles: vec![
                ParameterStyle::Numeric,
                ParameterStyle::QuestionMark,
                ParameterStyle::ColonNamed,
                ParameterStyle::PyformatNamed,
                ParameterStyle::PyformatPositional,
            ],
            allow_mixed: false,
        }
    }

    /// Create MySQL-specific profile
    pub fn mysql() -> Self {
        Self {
            default_style: ParameterStyle::QuestionMark,
            allowed_styles: vec![
                ParameterStyle::QuestionMark,
                ParameterStyle::ColonNamed,
                ParameterStyle::PyformatNamed,
                ParameterStyle::PyformatPositional,
            ],
            allow_mixed: false,
        }
    }

    /// Create SQLite-specific profile; SQLite natively accepts `?`, `?N`,
    /// `:name`, `@name`, and `$name`.
    pub fn sqlite() -> Self {
        Self {
            default_style: ParameterStyle::QuestionMark,
            allowed_styles: vec![
                ParameterStyle::QuestionMark,
                ParameterStyle::ColonNamed,
                ParameterStyle::ColonPositional,
                ParameterStyle::AtNamed,
                ParameterStyle::DollarNamed,
                ParameterStyle::Numeric,
            ],
            allow_mixed: false,
        }
    }

    /// Create SQL Server-specific profile
    pub fn mssql() -> Self {
        Self {
            default_style: ParameterStyle::AtNamed,
            allowed_styles: vec![
                ParameterStyle::AtNamed,
                ParameterStyle::QuestionMark,
                ParameterStyle::ColonNamed,
            ],
            allow_mixed: false,
        }
    }

    /// Create DuckDB-specific profile
    pub fn duckdb() -> Self {
        Self {
            default_style: ParameterStyle::QuestionMark,
            allowed_styles: vec![
                ParameterStyle::QuestionMark,
                ParameterStyle::Numeric,
                ParameterStyle::ColonNamed,
                ParameterStyle::DollarNamed,
            ],
            allow_mixed: false,
        }
    }

    /// Create ClickHouse-specific profile
    pub fn clickhouse() -> Self {
        Self {
            default_style: ParameterStyle::QuestionMark,
            allowed_styles: vec![
                ParameterStyle::QuestionMark,
                ParameterStyle::ColonNamed,
                ParameterStyle::PyformatNamed,
                ParameterStyle::PyformatPositional,
            ],
            allow_mixed: false,
        }
    }

    /// Create the permissive ANSI fallback profile: accepts every style
    pub fn ansi() -> Self {
        Self {
            default_style: ParameterStyle::QuestionMark,
            allowed_styles: vec![
                ParameterStyle::QuestionMark,
                ParameterStyle::Numeric,
                ParameterStyle::ColonNamed,
                ParameterStyle::ColonPositional,
                ParameterStyle::AtNamed,
                ParameterStyle::DollarNamed,
                ParameterStyle::PyformatNamed,
                ParameterStyle::PyformatPositional,
            ],
            allow_mixed: false,
        }
    }

    /// Whether the profile accepts a detected style. Static statements are
    /// always acceptable.
    pub fn allows(&self, style: ParameterStyle) -> bool {
        style == ParameterStyle::Static || self.allowed_styles.contains(&style)
    }

    /// Builder-style override of the default render style
    pub fn with_default_style(mut self, style: ParameterStyle) -> Self {
        self.default_style = style;
        self
    }

    /// Builder-style override of the mixed-style policy
    pub fn with_allow_mixed(mut self, allow: bool) -> Self {
        self.allow_mixed = allow;
        self
    }
}

impl Default for ParameterProfile {
    fn default() -> Self {
        Self::ansi()
    }
}
