use std::sync::Arc;

use crate::{
    compiler::{Compiled, Env, call_value},
    error::ExprError,
    sandbox::ensure_safe_name,
    value::{Lookup, Value},
};

static UNDEFINED: Value = Value::Undefined;

/// Where an access path starts.
pub(crate) enum PathRoot {
    /// A bare identifier: the first segment names it, and it resolves against
    /// the locals when they define it, the scope otherwise.
    Context,
    /// `this`
    This,
    /// `$locals`
    Locals,
    /// Any other expression, evaluated once per access (`f().x`, `[1, 2][0]`).
    Temporary(Compiled),
}

/// A segment in an access path.
pub(crate) enum PathSegment {
    /// Dotted access or identifier
    ///
    /// # Examples
    /// - `a.b` → `[Field("a"), Field("b")]`
    Field(String),

    /// Bracketed access; the key expression is evaluated and stringified on
    /// every access
    ///
    /// # Examples
    /// - `a[i + 1]` → `[Field("a"), Computed(i + 1)]`
    Computed(Compiled),
}

/// A compiled chain of member accesses, used for reads, writes and method
/// calls.
///
/// Every key is checked against the sandbox before anything is touched, so a
/// forbidden name fails the same way whether it is read, written or called.
pub(crate) struct AccessPath {
    root: PathRoot,
    segments: Vec<PathSegment>,
    expression: Arc<str>,
}

/// Keys of one access after evaluating computed segments.
pub(crate) struct Resolved {
    keys: Vec<String>,
    temporary: Option<Value>,
}

impl AccessPath {
    pub(crate) fn new(root: PathRoot, segments: Vec<PathSegment>, expression: Arc<str>) -> Self {
        AccessPath {
            root,
            segments,
            expression,
        }
    }

    /// Evaluates the root and computed keys, checking each key against the
    /// sandbox.
    pub(crate) fn resolve(&self, env: &mut Env<'_>) -> Result<Resolved, ExprError> {
        let temporary = match &self.root {
            PathRoot::Temporary(object) => Some(object(env)?),
            _ => None,
        };

        let mut keys = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let key = match segment {
                PathSegment::Field(name) => name.clone(),
                PathSegment::Computed(key) => key(env)?.to_display_string(),
            };
            ensure_safe_name(&key, &self.expression)?;
            keys.push(key);
        }

        Ok(Resolved { keys, temporary })
    }

    fn base<'e>(&self, env: &'e Env<'_>, resolved: &'e Resolved) -> &'e Value {
        match &self.root {
            PathRoot::Context => match resolved.keys.first() {
                Some(name) => env.base_for(name),
                None => env.scope(),
            },
            PathRoot::This => env.scope(),
            PathRoot::Locals => env.locals().unwrap_or(&UNDEFINED),
            PathRoot::Temporary(_) => resolved.temporary.as_ref().unwrap_or(&UNDEFINED),
        }
    }

    /// Reads the value at the end of the path. Missing intermediates read as
    /// `undefined` instead of failing.
    pub(crate) fn read(&self, env: &mut Env<'_>) -> Result<Value, ExprError> {
        let resolved = self.resolve(env)?;
        Ok(walk(self.base(env, &resolved), &resolved.keys, Value::clone))
    }

    /// Calls the function at the end of the path with the object holding it
    /// as receiver. Calling `null`/`undefined` yields `undefined`.
    pub(crate) fn call(&self, env: &mut Env<'_>, arguments: &[Compiled]) -> Result<Value, ExprError> {
        let resolved = self.resolve(env)?;
        let function = walk(self.base(env, &resolved), &resolved.keys, Value::clone);

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(argument(env)?);
        }

        let receiver = &resolved.keys[..resolved.keys.len().saturating_sub(1)];
        walk(self.base(env, &resolved), receiver, |this| {
            call_value(&function, this, &values, &self.expression)
        })
    }

    /// Writes `value` at the end of the path, creating intermediate objects.
    /// Returns the assigned value.
    pub(crate) fn assign(&self, env: &mut Env<'_>, value: Value) -> Result<Value, ExprError> {
        let resolved = self.resolve(env)?;
        self.write(env, resolved, value)
    }

    /// Writes `value` at a location resolved earlier with [`Self::resolve`].
    pub(crate) fn write(
        &self,
        env: &mut Env<'_>,
        resolved: Resolved,
        value: Value,
    ) -> Result<Value, ExprError> {
        let Resolved {
            keys,
            mut temporary,
        } = resolved;
        let Some((last, parents)) = keys.split_last() else {
            return Err(ExprError::non_assignable(&self.expression));
        };

        let mut target = match &self.root {
            PathRoot::Context => env.base_for_mut(&keys[0]),
            PathRoot::This => env.scope_mut(),
            PathRoot::Locals => match env.locals_mut() {
                Some(locals) => locals,
                None => temporary.get_or_insert_with(Value::default),
            },
            PathRoot::Temporary(_) => temporary.get_or_insert_with(Value::default),
        };
        for key in parents {
            target = target.child_mut(key)?;
        }
        target.set_property(last, value.clone())?;
        Ok(value)
    }
}

/// Follows `keys` from `base` by reference and hands the final value to `f`.
fn walk<R>(base: &Value, keys: &[String], f: impl FnOnce(&Value) -> R) -> R {
    let mut current = base;
    for (i, key) in keys.iter().enumerate() {
        match current.property(key) {
            Lookup::Borrowed(next) => current = next,
            Lookup::Computed(owned) => return walk(&owned, &keys[i + 1..], f),
            Lookup::Missing => return f(&UNDEFINED),
        }
    }
    f(current)
}
