use async_trait::async_trait;

use crate::value::SqlValue;

/// A backend error reported by the statement-execution collaborator. The
/// engine propagates these verbatim; it never retries or reinterprets them.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn from_source(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self { message: error.to_string(), source: Some(Box::new(error)) }
    }
}

/// Blocking statement execution, provided by the surrounding relational
/// layer. `provider_id` names the active backend and keys the dialect lookup
/// in the [`crate::ProviderRegistry`].
pub trait StatementExecutor {
    fn provider_id(&self) -> &str;

    /// Runs a non-query statement and reports the number of affected rows.
    fn execute(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError>;

    /// Runs a key-returning insert and yields one primary key per inserted
    /// row, in insertion order.
    fn query_keys(&self, query: &str, parameters: &[SqlValue])
        -> Result<Vec<SqlValue>, ExecutionError>;
}

/// Asynchronous twin of [`StatementExecutor`]. The engine awaits one batch at
/// a time; it never issues two batches concurrently against the same session.
#[async_trait]
pub trait AsyncStatementExecutor: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn execute(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError>;

    async fn query_keys(
        &self,
        query: &str,
        parameters: &[SqlValue],
    ) -> Result<Vec<SqlValue>, ExecutionError>;
}
