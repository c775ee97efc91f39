//! Memoized compilation.
//!
//! The same source text compiled twice yields the same [`Evaluator`]
//! instance. Entries are keyed by `(source, isolate_literal)` and live as long
//! as the cache; nothing is evicted.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use log::{debug, trace};

use crate::{
    compiler::{Evaluator, compile_with},
    error::ExprError,
    filters::{FilterRegistry, FilterResolver},
    options::ParseOptions,
};

type CacheKey = (String, bool);

pub struct ExpressionCache {
    resolver: Arc<dyn FilterResolver>,
    options: ParseOptions,
    entries: RwLock<HashMap<CacheKey, Arc<Evaluator>>>,
}

static GLOBAL: LazyLock<ExpressionCache> =
    LazyLock::new(|| ExpressionCache::new(Arc::new(FilterRegistry::with_builtins())));

/// The process-wide cache, resolving filters against the built-ins.
pub fn global() -> &'static ExpressionCache {
    &GLOBAL
}

impl ExpressionCache {
    pub fn new(resolver: Arc<dyn FilterResolver>) -> Self {
        Self::with_options(resolver, ParseOptions::default())
    }

    pub fn with_options(resolver: Arc<dyn FilterResolver>, options: ParseOptions) -> Self {
        ExpressionCache {
            resolver,
            options,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the evaluator for `source`, compiling it on first use.
    ///
    /// With `isolate_literal`, the source must be a literal built only from
    /// literals (`[1, {"a": true}]`), and the result is cached apart from a
    /// regular compilation of the same text. Failed compilations are not
    /// cached.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use bindexpr::{ExpressionCache, FilterRegistry};
    ///
    /// let cache = ExpressionCache::new(Arc::new(FilterRegistry::new()));
    /// let first = cache.get_or_compile("a.b", false).unwrap();
    /// let second = cache.get_or_compile("a.b", false).unwrap();
    /// assert!(Arc::ptr_eq(&first, &second));
    /// ```
    pub fn get_or_compile(
        &self,
        source: &str,
        isolate_literal: bool,
    ) -> Result<Arc<Evaluator>, ExprError> {
        let key = (source.to_string(), isolate_literal);

        if let Some(evaluator) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace!("expression cache hit for [{}]", source);
            return Ok(Arc::clone(evaluator));
        }

        // Compile without holding the lock: filters may compile expressions
        // through this same cache.
        debug!(
            "expression cache miss for [{}] (isolate_literal={})",
            source, isolate_literal
        );
        let compiled = match compile_with(source, self.resolver.as_ref(), &self.options, isolate_literal) {
            Ok(evaluator) => Arc::new(evaluator),
            Err(err) => {
                debug!("compilation of [{}] failed: {}", source, err);
                return Err(err);
            }
        };

        // A racing compilation may have won; keep whichever got there first.
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(compiled)))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("options", &self.options)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
