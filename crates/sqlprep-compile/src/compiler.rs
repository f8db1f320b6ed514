//! Statement compiler facade
//!
//! Orchestrates the full path: tokenize, canonicalize, parse, run the
//! pipeline, cache the compiled state, render the requested placeholder
//! style, and shape the parameter payload. Compilation is synchronous and
//! CPU-bound; the only shared state is the bounded cache, and no lock is
//! ever held across parsing or transformation.

use crate::cache::{CacheKey, CacheStats, StatementCache};
use crate::error::{CompileError, CompileResult};
use crate::parameters::{
    ParameterBinding, ParameterInfo, ParameterStyleConverter, ParameterTokenizer,
    ShapedParameters,
};
use crate::pipeline::{Pipeline, ProcessingContext, TransformationRecord};
use lru::LruCache;
use parking_lot::Mutex;
use sqlprep_core::{
    CompilerConfig, ParameterStyle, RiskLevel, SqlDialect, TypedParameter, ValidationFinding,
};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Immutable result of processing one distinct (SQL, dialect, shape)
/// combination. Created once, shared via `Arc`, cached until evicted.
#[derive(Debug)]
pub struct CompiledState {
    original_sql: String,
    canonical_sql: String,
    parameter_info: Arc<Vec<ParameterInfo>>,
    promoted: Vec<TypedParameter>,
    findings: Vec<ValidationFinding>,
    transformations: Vec<TransformationRecord>,
    metadata: HashMap<String, serde_json::Value>,
    cache_key: CacheKey,
}

impl CompiledState {
    /// The SQL text exactly as submitted
    pub fn original_sql(&self) -> &str {
        &self.original_sql
    }

    /// The processed statement in canonical (`$N`) placeholder form
    pub fn canonical_sql(&self) -> &str {
        &self.canonical_sql
    }

    /// Placeholders detected in the original text, in scan order
    pub fn parameter_info(&self) -> &[ParameterInfo] {
        &self.parameter_info
    }

    /// Parameters synthesized from promoted literals
    pub fn promoted(&self) -> &[TypedParameter] {
        &self.promoted
    }

    /// Non-blocking findings accumulated during validation, in order
    pub fn validation_errors(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Before/after transformation diagnostics, in order
    pub fn transformations(&self) -> &[TransformationRecord] {
        &self.transformations
    }

    /// Free-form diagnostics recorded by processors
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// The key this state is cached under
    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }
}

/// A compiled statement: final SQL text plus the parameter payload shaped
/// for the rendered placeholder style.
#[derive(Debug)]
pub struct Compiled {
    /// The rendered SQL text
    pub sql: String,
    /// Values shaped for the rendered style
    pub parameters: ShapedParameters,
    state: Arc<CompiledState>,
}

impl Compiled {
    /// The shared compiled state backing this result
    pub fn state(&self) -> &Arc<CompiledState> {
        &self.state
    }

    /// The rendered SQL pretty-printed for logs and diagnostics
    pub fn pretty_sql(&self) -> String {
        sqlformat::format(
            &self.sql,
            &sqlformat::QueryParams::None,
            &sqlformat::FormatOptions::default(),
        )
    }

    /// Split into the `(sql, parameters)` pair drivers consume
    pub fn into_parts(self) -> (String, ShapedParameters) {
        (self.sql, self.parameters)
    }
}

/// The statement compiler facade
pub struct StatementCompiler {
    config: CompilerConfig,
    tokenizer: ParameterTokenizer,
    cache: StatementCache,
    renderings: Mutex<LruCache<(CacheKey, ParameterStyle), String>>,
}

impl StatementCompiler {
    /// Create a compiler from a configuration
    pub fn new(config: CompilerConfig) -> Self {
        let rendering_capacity =
            NonZeroUsize::new(config.cache_capacity.max(1)).expect("clamped to at least 1");
        Self {
            tokenizer: ParameterTokenizer::new(config.tokenizer_cache_capacity),
            cache: StatementCache::new(config.cache_capacity),
            renderings: Mutex::new(LruCache::new(rendering_capacity)),
            config,
        }
    }

    /// Create a compiler with a dialect's default configuration
    pub fn for_dialect(dialect: SqlDialect) -> Self {
        Self::new(CompilerConfig::for_dialect(dialect))
    }

    /// The configuration in effect
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Statement-cache statistics for operational tooling
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached compilation, rendering, and tokenization
    pub fn clear_caches(&self) {
        self.cache.clear();
        self.renderings.lock().clear();
        self.tokenizer.clear();
    }

    /// Compile `sql`, rendering the dialect profile's default placeholder
    /// style.
    pub fn compile(
        &self,
        sql: &str,
        args: impl Into<ParameterBinding>,
    ) -> CompileResult<Compiled> {
        self.compile_with(sql, args.into(), None)
    }

    /// Compile `sql`, rendering an explicit target placeholder style.
    pub fn compile_as(
        &self,
        sql: &str,
        args: impl Into<ParameterBinding>,
        style: ParameterStyle,
    ) -> CompileResult<Compiled> {
        self.compile_with(sql, args.into(), Some(style))
    }

    #[tracing::instrument(
        skip(self, sql, binding),
        fields(
            dialect = %self.config.dialect,
            sql_preview = %sql.chars().take(100).collect::<String>(),
        )
    )]
    fn compile_with(
        &self,
        sql: &str,
        binding: ParameterBinding,
        style: Option<ParameterStyle>,
    ) -> CompileResult<Compiled> {
        let target = style.unwrap_or_else(|| self.config.effective_profile().default_style);
        let infos = self.tokenizer.extract(sql);
        let key = CacheKey::new(hash_text(sql), shape_hash(&binding), self.config.dialect);

        let state = match self.cache.get(&key) {
            Some(state) => {
                tracing::debug!("statement cache hit");
                state
            }
            None => {
                let state = self.process(sql, Arc::clone(&infos), &binding, key)?;
                self.cache.get_or_insert(key, state)
            }
        };

        if target == ParameterStyle::Static && !state.parameter_info.is_empty() {
            return Err(CompileError::UnsupportedStyle(target));
        }

        let sql_out = self.rendered_for(&state, key, target)?;
        let parameters = ParameterStyleConverter::shape_canonical(
            &state.canonical_sql,
            &state.parameter_info,
            &state.promoted,
            &binding,
            target,
        )?;

        Ok(Compiled {
            sql: sql_out,
            parameters,
            state,
        })
    }

    /// Run the pipeline and build the immutable compiled state.
    fn process(
        &self,
        sql: &str,
        infos: Arc<Vec<ParameterInfo>>,
        binding: &ParameterBinding,
        key: CacheKey,
    ) -> CompileResult<Arc<CompiledState>> {
        let mut ctx =
            ProcessingContext::new(sql, &self.config, Arc::clone(&infos), binding.clone());
        let pipeline = Pipeline::for_config(&self.config);
        pipeline.run(&mut ctx);

        if let Some(risk) = ctx.blocking_risk() {
            let (_, _, _, findings, _, _) = ctx.into_parts();
            return Err(error_from_findings(findings, risk));
        }

        let (statement, promoted, hints, findings, transformations, metadata) = ctx.into_parts();
        let Some(statement) = statement else {
            return Err(CompileError::Parse(
                "statement unavailable after processing".to_string(),
            ));
        };

        let mut canonical_sql = statement.to_string();
        if !hints.is_empty() {
            canonical_sql = inject_hints(&canonical_sql, &hints);
        }

        Ok(Arc::new(CompiledState {
            original_sql: sql.to_string(),
            canonical_sql,
            parameter_info: infos,
            promoted,
            findings,
            transformations,
            metadata,
            cache_key: key,
        }))
    }

    /// Render the compiled state into a target style, memoized per
    /// (base key, style).
    fn rendered_for(
        &self,
        state: &CompiledState,
        key: CacheKey,
        target: ParameterStyle,
    ) -> CompileResult<String> {
        if let Some(hit) = self.renderings.lock().get(&(key, target)) {
            return Ok(hit.clone());
        }
        let rendered = ParameterStyleConverter::render_canonical(
            &state.canonical_sql,
            &state.parameter_info,
            &state.promoted,
            target,
        )?;
        self.renderings.lock().put((key, target), rendered.clone());
        Ok(rendered)
    }
}

/// Pick the typed error matching the worst blocking finding.
fn error_from_findings(findings: Vec<ValidationFinding>, risk: RiskLevel) -> CompileError {
    let primary = findings.iter().find(|f| f.risk >= risk).cloned();
    match primary {
        Some(finding)
            if matches!(
                finding.code.as_str(),
                "parse_error" | "empty_statement" | "multiple_statements"
            ) =>
        {
            CompileError::Parse(finding.message)
        }
        Some(finding) if finding.code == "parameter_mismatch" => {
            CompileError::ParameterMismatch(finding.message)
        }
        Some(finding) => CompileError::Validation {
            message: finding.message,
            risk,
            findings,
        },
        None => CompileError::Validation {
            message: "compilation failed".to_string(),
            risk,
            findings,
        },
    }
}

/// Re-attach preserved optimizer hints right after the leading keyword.
fn inject_hints(sql: &str, hints: &[String]) -> String {
    let joined = hints.join(" ");
    match sql.split_once(' ') {
        Some((head, rest)) => format!("{} {} {}", head, joined, rest),
        None => format!("{} {}", sql, joined),
    }
}

fn hash_text(sql: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    sql.hash(&mut hasher);
    hasher.finish()
}

/// Hash of the parameter shape descriptor: binding kind, names, arity, and
/// value type tags. Value contents never participate, so payloads differing
/// only in values share a cache entry.
fn shape_hash(binding: &ParameterBinding) -> u64 {
    let mut hasher = DefaultHasher::new();
    match binding {
        ParameterBinding::None => 0u8.hash(&mut hasher),
        ParameterBinding::Positional(values) => {
            1u8.hash(&mut hasher);
            values.len().hash(&mut hasher);
            for value in values {
                value.type_tag().hash(&mut hasher);
            }
        }
        ParameterBinding::Named(named) => {
            2u8.hash(&mut hasher);
            hash_named(named, &mut hasher);
        }
        ParameterBinding::Mixed { positional, named } => {
            3u8.hash(&mut hasher);
            positional.len().hash(&mut hasher);
            for value in positional {
                value.type_tag().hash(&mut hasher);
            }
            hash_named(named, &mut hasher);
        }
    }
    hasher.finish()
}

fn hash_named(named: &indexmap::IndexMap<String, sqlprep_core::Value>, hasher: &mut DefaultHasher) {
    // Sorted so that insertion order never changes the shape.
    let mut names: Vec<&String> = named.keys().collect();
    names.sort();
    names.len().hash(hasher);
    for name in names {
        name.hash(hasher);
        if let Some(value) = named.get(name) {
            value.type_tag().hash(hasher);
        }
    }
}
