//! Named value transformers applied with the `|` syntax.
//!
//! `a | name:x:y` compiles to a call of the filter `name` with arguments
//! `[a, x, y]`. The compiler looks filters up through a [`FilterResolver`]
//! once, at compile time.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{error::ExprError, value::Value};

mod builtins;

pub type FilterFn = dyn Fn(&[Value]) -> Result<Value, ExprError> + Send + Sync;

/// A filter implementation. The first argument is the piped input.
#[derive(Clone)]
pub struct Filter {
    func: Arc<FilterFn>,
    stateful: bool,
}

impl Filter {
    /// A pure filter: same arguments, same result. Constant folding and
    /// watch inputs see through it.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        Filter {
            func: Arc::new(func),
            stateful: false,
        }
    }

    /// A filter whose result may change between calls with equal arguments.
    /// Expressions using it are never constant.
    pub fn stateful<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        Filter {
            func: Arc::new(func),
            stateful: true,
        }
    }

    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    pub fn apply(&self, args: &[Value]) -> Result<Value, ExprError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("stateful", &self.stateful)
            .finish_non_exhaustive()
    }
}

/// Maps filter names to implementations.
pub trait FilterResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Filter>;
}

impl<F> FilterResolver for F
where
    F: Fn(&str) -> Option<Filter> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Filter> {
        self(name)
    }
}

/// A `HashMap`-backed resolver.
///
/// # Examples
///
/// ```
/// use bindexpr::{Filter, FilterRegistry, FilterResolver, Value};
///
/// let registry = FilterRegistry::new().register("twice", Filter::new(|args| {
///     Ok(Value::from(args.first().map_or(0.0, Value::to_number) * 2.0))
/// }));
/// assert!(registry.resolve("twice").is_some());
/// assert!(registry.resolve("uppercase").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `uppercase`, `lowercase`, `json`, `limitTo`,
    /// `orderBy`, `number` and `filter`.
    ///
    /// `orderBy` compiles its key expressions with the global cache, so
    /// custom parse options and filters do not apply inside them.
    pub fn with_builtins() -> Self {
        builtins::register_all(Self::new())
    }

    /// Adds or replaces the filter called `name`.
    pub fn register(mut self, name: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }
}

impl FilterResolver for FilterRegistry {
    fn resolve(&self, name: &str) -> Option<Filter> {
        self.filters.get(name).cloned()
    }
}
