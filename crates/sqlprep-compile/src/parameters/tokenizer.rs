//! SQL parameter tokenizer
//!
//! A single composed pattern scans the SQL left to right. Alternatives are
//! ordered so that quoted strings, dollar-quoted strings, comments, type
//! casts, and operator lookalikes are matched and discarded before any
//! placeholder alternative is attempted; a placeholder-looking substring
//! inside a literal or comment is therefore never reported.

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlprep_core::ParameterStyle;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock};

/// A placeholder detected in a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name, for named styles
    pub name: Option<String>,
    /// The placeholder's style
    pub style: ParameterStyle,
    /// Byte offset of the placeholder in the SQL text
    pub position: usize,
    /// Zero-based index in scan order; increments only for genuine
    /// placeholders, never for discarded lookalikes
    pub ordinal: usize,
    /// The placeholder exactly as written (`:id`, `$2`, `%(name)s`, ...)
    pub text: String,
}

impl ParameterInfo {
    /// The explicit one-based slot index carried by `$N` / `:N`
    /// placeholders, if any.
    pub fn explicit_index(&self) -> Option<usize> {
        match self.style {
            ParameterStyle::Numeric | ParameterStyle::ColonPositional => {
                self.text[1..].parse().ok()
            }
            _ => None,
        }
    }

    /// Byte range the placeholder occupies in the source text
    pub fn span(&self) -> std::ops::Range<usize> {
        self.position..self.position + self.text.len()
    }
}

// One alternation, ordered: everything that must be discarded comes before
// every placeholder alternative. The `(?s)` flag lets block comments and
// dollar-quoted bodies span lines; line comments stay single-line via [^\n].
static SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)"#,
        // -- discarded alternatives --
        r#"(?P<dquote>"(?:[^"\\]|\\.)*")"#,
        r#"|(?P<squote>'(?:[^'\\]|\\.|'')*')"#,
        r#"|(?P<dollar_quote>\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$.*?\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$)"#,
        r#"|(?P<line_comment>--[^\n]*)"#,
        r#"|(?P<block_comment>/\*.*?\*/)"#,
        r#"|(?P<cast>::[A-Za-z_][A-Za-z0-9_]*)"#,
        // PostgreSQL JSON operators, never qmark placeholders
        r#"|(?P<json_op>\?\?|\?\||\?&)"#,
        // MySQL system variables (@@version), never at-named placeholders
        r#"|(?P<sysvar>@@[A-Za-z_][A-Za-z0-9_]*)"#,
        // literal percent escape
        r#"|(?P<pct_escape>%%)"#,
        // -- placeholder alternatives --
        r#"|(?P<pyformat_named>%\((?P<py_name>[A-Za-z_][A-Za-z0-9_]*)\)s)"#,
        r#"|(?P<pyformat_positional>%s)"#,
        r#"|(?P<numeric>\$\d+)"#,
        r#"|(?P<dollar_named>\$(?P<dollar_name>[A-Za-z_][A-Za-z0-9_]*))"#,
        r#"|(?P<colon_positional>:\d+)"#,
        r#"|(?P<colon_named>:(?P<colon_name>[A-Za-z_][A-Za-z0-9_]*))"#,
        r#"|(?P<at_named>@(?P<at_name>[A-Za-z_][A-Za-z0-9_]*))"#,
        r#"|(?P<qmark>\?)"#,
    ))
    .expect("valid parameter scan pattern")
});

/// Scan SQL text and classify every genuine placeholder, in order.
fn scan(sql: &str) -> Vec<ParameterInfo> {
    let mut infos = Vec::new();
    let mut ordinal = 0usize;

    for caps in SCAN_RE.captures_iter(sql) {
        let (style, name) = if let Some(m) = caps.name("py_name") {
            (ParameterStyle::PyformatNamed, Some(m.as_str().to_string()))
        } else if caps.name("pyformat_positional").is_some() {
            (ParameterStyle::PyformatPositional, None)
        } else if caps.name("numeric").is_some() {
            (ParameterStyle::Numeric, None)
        } else if let Some(m) = caps.name("dollar_name") {
            (ParameterStyle::DollarNamed, Some(m.as_str().to_string()))
        } else if caps.name("colon_positional").is_some() {
            (ParameterStyle::ColonPositional, None)
        } else if let Some(m) = caps.name("colon_name") {
            (ParameterStyle::ColonNamed, Some(m.as_str().to_string()))
        } else if let Some(m) = caps.name("at_name") {
            (ParameterStyle::AtNamed, Some(m.as_str().to_string()))
        } else if caps.name("qmark").is_some() {
            (ParameterStyle::QuestionMark, None)
        } else {
            // String, comment, cast, or operator lookalike: discarded.
            continue;
        };

        let whole = caps.get(0).expect("match has a root group");
        infos.push(ParameterInfo {
            name,
            style,
            position: whole.start(),
            ordinal,
            text: whole.as_str().to_string(),
        });
        ordinal += 1;
    }

    infos
}

/// Distinct styles among detected placeholders, in first-appearance order.
pub fn detected_styles(infos: &[ParameterInfo]) -> Vec<ParameterStyle> {
    let mut styles = Vec::new();
    for info in infos {
        if !styles.contains(&info.style) {
            styles.push(info.style);
        }
    }
    styles
}

/// The single detected style, if the statement uses exactly one.
/// `None` means either no placeholders or mixed styles.
pub fn detected_style(infos: &[ParameterInfo]) -> Option<ParameterStyle> {
    let styles = detected_styles(infos);
    match styles.len() {
        1 => Some(styles[0]),
        _ => None,
    }
}

/// Extracts placeholders from SQL text, memoizing results per instance.
///
/// Extraction is a pure function of the SQL text alone, so the same text is
/// only ever scanned once; repeat compiles of a hot statement hit the
/// bounded LRU memo instead.
pub struct ParameterTokenizer {
    cache: Mutex<LruCache<String, Arc<Vec<ParameterInfo>>>>,
}

impl ParameterTokenizer {
    /// Create a tokenizer whose memo holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("clamped to at least 1");
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Extract all placeholders from `sql` in scan order.
    pub fn extract(&self, sql: &str) -> Arc<Vec<ParameterInfo>> {
        if let Some(hit) = self.cache.lock().get(sql) {
            return Arc::clone(hit);
        }
        let infos = Arc::new(scan(sql));
        self.cache.lock().put(sql.to_string(), Arc::clone(&infos));
        infos
    }

    /// Number of memoized extractions currently held
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop all memoized extractions
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl Default for ParameterTokenizer {
    fn default() -> Self {
        Self::new(512)
    }
}
