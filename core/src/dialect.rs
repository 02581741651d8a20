/// Backend-specific statement shaping. A dialect decides the positional
/// placeholder syntax and whether an insert can hand generated keys back in
/// the same round trip via `RETURNING`. The update path is shared: the
/// `CASE`-driven SQL is portable across both.
///
/// Dialects are stateless; one instance serves every call that resolves it
/// from the [`crate::ProviderRegistry`].
pub trait DialectStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Renders the placeholder for the parameter at 1-based `position` in the
    /// statement's parameter list.
    fn placeholder(&self, position: usize) -> String;

    fn supports_returning(&self) -> bool;
}

/// Dialect for backends that support `RETURNING` (postgres, sqlite): inserts
/// that want keys append `RETURNING <pk>` and read the generated keys from
/// the same round trip, in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturningDialect;

impl DialectStrategy for ReturningDialect {
    fn name(&self) -> &'static str {
        "returning"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// Dialect for backends without a usable `RETURNING` clause. Inserts never
/// append one, and batched key retrieval is reported as unsupported by the
/// engine rather than silently falling back to per-row statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl DialectStrategy for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("?{}", position)
    }

    fn supports_returning(&self) -> bool {
        false
    }
}
