mod batching;
mod dialect;
mod engine;
mod executor;
mod logger;
mod model;
mod modification;
mod registry;
mod statements;
mod value;

mod postgres;
pub use postgres::client::{
    connection_string, PostgresClient, PostgresConnectionError, PostgresError,
    POSTGRES_PROVIDER_ID,
};

pub use batching::{split_into_batches, split_into_batches_mut, BatchingError};
pub use dialect::{DialectStrategy, GenericDialect, ReturningDialect};
pub use engine::{BulkEngine, BulkOperationError, DEFAULT_BATCH_SIZE};
pub use executor::{AsyncStatementExecutor, ExecutionError, StatementExecutor};
pub use logger::{setup_info_logger, setup_logger};
pub use model::{
    BulkEntity, ColumnDescriptor, ColumnGetter, ColumnSetter, EntityColumnModel,
    EntityColumnModelBuilder, ModelCache, ModelDefinitionError,
};
pub use modification::{ModificationSet, ModificationTracker};
pub use registry::{ProviderRegistry, ProviderRegistryError};
pub use statements::{
    build_insert, build_update, InsertStatement, StatementBuildError, UpdateStatement,
};
pub use value::SqlValue;

// export 3rd party dependencies
pub use async_trait::async_trait;
pub use tokio_postgres::types::ToSql as PgToSql;

#[cfg(test)]
mod test_support;
