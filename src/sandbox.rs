//! Names expressions may never read, write or call.

use crate::error::ExprError;

/// Property names that reach into an object model's metaobject machinery
/// rather than into data. Blocked on every member access and identifier
/// lookup, whether spelled literally or produced by a computed key.
pub const FORBIDDEN_NAMES: &[&str] = &[
    "constructor",
    "prototype",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
];

pub fn is_forbidden(name: &str) -> bool {
    FORBIDDEN_NAMES.contains(&name)
}

pub fn ensure_safe_name(name: &str, expression: &str) -> Result<(), ExprError> {
    if is_forbidden(name) {
        return Err(ExprError::Security {
            field: name.to_string(),
            expression: expression.to_string(),
        });
    }
    Ok(())
}
