use std::sync::Arc;

use tracing::debug;

use crate::{
    batching::{split_into_batches, split_into_batches_mut, BatchingError},
    dialect::DialectStrategy,
    executor::{AsyncStatementExecutor, ExecutionError, StatementExecutor},
    model::{BulkEntity, EntityColumnModel, ModelCache, ModelDefinitionError},
    modification::ModificationSet,
    registry::{ProviderRegistry, ProviderRegistryError},
    statements::{build_insert, build_update, StatementBuildError},
};

/// Rows packed into one statement when the caller has no preference.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum BulkOperationError {
    #[error("{0}")]
    Batching(#[from] BatchingError),

    #[error("{0}")]
    Model(#[from] ModelDefinitionError),

    #[error("{0}")]
    Statement(#[from] StatementBuildError),

    #[error("{0}")]
    Registry(#[from] ProviderRegistryError),

    #[error("the '{0}' dialect does not support batched key retrieval")]
    KeyRetrievalUnsupported(&'static str),

    #[error("expected {expected} generated keys but the database returned {got}")]
    ReturnedKeyCountMismatch { expected: usize, got: usize },

    #[error("the primary key column '{0}' has no setter to backfill generated keys into")]
    PrimaryKeyNotWritable(String),

    #[error("{0}")]
    Execution(#[from] ExecutionError),
}

/// The public face of the engine: batches an entity collection, shapes one
/// statement per batch through the dialect resolved for the executor's
/// provider, and hands the statements to the executor sequentially.
///
/// Batches run strictly one after another; when a batch fails the call stops
/// there and the batches already executed stay committed. Callers that need
/// all-or-nothing behavior wrap the call in their own transaction scope.
pub struct BulkEngine<X> {
    registry: Arc<ProviderRegistry>,
    models: ModelCache,
    executor: X,
}

impl<X> BulkEngine<X> {
    pub fn new(registry: Arc<ProviderRegistry>, executor: X) -> Self {
        Self { registry, models: ModelCache::new(), executor }
    }

    /// Engine over a registry pre-populated with the stock providers.
    pub fn with_default_schemes(executor: X) -> Self {
        Self::new(Arc::new(ProviderRegistry::with_default_schemes()), executor)
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    fn dialect_for(&self, provider_id: &str) -> Result<Arc<dyn DialectStrategy>, ProviderRegistryError> {
        self.registry.resolve(provider_id)
    }

    fn validate_update_arguments<T: BulkEntity>(
        model: &EntityColumnModel<T>,
        entities: &[T],
        properties: &[&str],
        modifications: &ModificationSet,
    ) -> Result<(), BulkOperationError> {
        if properties.is_empty() {
            return Err(StatementBuildError::NoProperties.into());
        }

        for property in properties {
            if model.column_named(property).is_none() {
                return Err(StatementBuildError::UnknownColumn {
                    property: property.to_string(),
                    table: model.table_name().to_string(),
                }
                .into());
            }
        }

        if modifications.len() != entities.len() {
            return Err(StatementBuildError::ModificationSetMismatch {
                expected: entities.len(),
                got: modifications.len(),
            }
            .into());
        }

        Ok(())
    }
}

impl<X: AsyncStatementExecutor> BulkEngine<X> {
    /// Inserts the collection in multi-row batches and returns the summed
    /// affected-row count.
    pub async fn bulk_insert<T: BulkEntity>(
        &self,
        entities: &[T],
        batch_size: usize,
    ) -> Result<u64, BulkOperationError> {
        let batches = split_into_batches(entities, batch_size)?;
        if batches.is_empty() {
            return Ok(0);
        }

        let model = self.models.resolve::<T>()?;
        let dialect = self.dialect_for(self.executor.provider_id())?;

        let mut affected_rows = 0;
        for batch in batches {
            let statement = build_insert(&model, batch, false, dialect.as_ref())?;
            debug!("bulk insert statement: {}", statement.query);
            affected_rows += self.executor.execute(&statement.query, &statement.parameters).await?;
        }

        Ok(affected_rows)
    }

    /// Like [`bulk_insert`](Self::bulk_insert), but retrieves the
    /// database-generated primary keys and writes them back onto the entities
    /// batch by batch, in positional correspondence with the input order.
    pub async fn bulk_insert_returning_keys<T: BulkEntity>(
        &self,
        entities: &mut [T],
        batch_size: usize,
    ) -> Result<(), BulkOperationError> {
        let batches = split_into_batches_mut(entities, batch_size)?;
        if batches.is_empty() {
            return Ok(());
        }

        let model = self.models.resolve::<T>()?;
        if !model.primary_key().is_writable() {
            return Err(BulkOperationError::PrimaryKeyNotWritable(
                model.primary_key().name().to_string(),
            ));
        }

        let dialect = self.dialect_for(self.executor.provider_id())?;
        if !dialect.supports_returning() {
            return Err(BulkOperationError::KeyRetrievalUnsupported(dialect.name()));
        }

        for batch in batches {
            let statement = build_insert(&model, &batch[..], true, dialect.as_ref())?;
            debug!("bulk insert statement: {}", statement.query);

            let keys = self.executor.query_keys(&statement.query, &statement.parameters).await?;
            if keys.len() != batch.len() {
                return Err(BulkOperationError::ReturnedKeyCountMismatch {
                    expected: batch.len(),
                    got: keys.len(),
                });
            }

            for (entity, key) in batch.iter_mut().zip(keys) {
                model.primary_key().write(entity, key);
            }
        }

        Ok(())
    }

    /// Updates the requested properties of every entity whose modification
    /// set marks them changed, one `UPDATE ... CASE` statement per batch, and
    /// returns the summed affected-row count. Batches in which nothing
    /// changed are skipped without touching the database.
    pub async fn bulk_update<T: BulkEntity>(
        &self,
        entities: &[T],
        properties: &[&str],
        modifications: &ModificationSet,
        batch_size: usize,
    ) -> Result<u64, BulkOperationError> {
        let batches = split_into_batches(entities, batch_size)?;
        let model = self.models.resolve::<T>()?;
        Self::validate_update_arguments(&model, entities, properties, modifications)?;

        if batches.is_empty() {
            return Ok(0);
        }

        let dialect = self.dialect_for(self.executor.provider_id())?;

        let mut affected_rows = 0;
        let mut offset = 0;
        for batch in batches {
            let modified = modifications.batch(offset, batch.len());
            offset += batch.len();

            let statement = build_update(&model, batch, properties, modified, dialect.as_ref())?;
            if statement.is_noop() {
                continue;
            }

            debug!("bulk update statement: {}", statement.query);
            affected_rows += self.executor.execute(&statement.query, &statement.parameters).await?;
        }

        Ok(affected_rows)
    }
}

impl<X: StatementExecutor> BulkEngine<X> {
    /// Blocking form of [`bulk_insert`](Self::bulk_insert).
    pub fn bulk_insert_blocking<T: BulkEntity>(
        &self,
        entities: &[T],
        batch_size: usize,
    ) -> Result<u64, BulkOperationError> {
        let batches = split_into_batches(entities, batch_size)?;
        if batches.is_empty() {
            return Ok(0);
        }

        let model = self.models.resolve::<T>()?;
        let dialect = self.dialect_for(self.executor.provider_id())?;

        let mut affected_rows = 0;
        for batch in batches {
            let statement = build_insert(&model, batch, false, dialect.as_ref())?;
            debug!("bulk insert statement: {}", statement.query);
            affected_rows += self.executor.execute(&statement.query, &statement.parameters)?;
        }

        Ok(affected_rows)
    }

    /// Blocking form of
    /// [`bulk_insert_returning_keys`](Self::bulk_insert_returning_keys).
    pub fn bulk_insert_returning_keys_blocking<T: BulkEntity>(
        &self,
        entities: &mut [T],
        batch_size: usize,
    ) -> Result<(), BulkOperationError> {
        let batches = split_into_batches_mut(entities, batch_size)?;
        if batches.is_empty() {
            return Ok(());
        }

        let model = self.models.resolve::<T>()?;
        if !model.primary_key().is_writable() {
            return Err(BulkOperationError::PrimaryKeyNotWritable(
                model.primary_key().name().to_string(),
            ));
        }

        let dialect = self.dialect_for(self.executor.provider_id())?;
        if !dialect.supports_returning() {
            return Err(BulkOperationError::KeyRetrievalUnsupported(dialect.name()));
        }

        for batch in batches {
            let statement = build_insert(&model, &batch[..], true, dialect.as_ref())?;
            debug!("bulk insert statement: {}", statement.query);

            let keys = self.executor.query_keys(&statement.query, &statement.parameters)?;
            if keys.len() != batch.len() {
                return Err(BulkOperationError::ReturnedKeyCountMismatch {
                    expected: batch.len(),
                    got: keys.len(),
                });
            }

            for (entity, key) in batch.iter_mut().zip(keys) {
                model.primary_key().write(entity, key);
            }
        }

        Ok(())
    }

    /// Blocking form of [`bulk_update`](Self::bulk_update).
    pub fn bulk_update_blocking<T: BulkEntity>(
        &self,
        entities: &[T],
        properties: &[&str],
        modifications: &ModificationSet,
        batch_size: usize,
    ) -> Result<u64, BulkOperationError> {
        let batches = split_into_batches(entities, batch_size)?;
        let model = self.models.resolve::<T>()?;
        Self::validate_update_arguments(&model, entities, properties, modifications)?;

        if batches.is_empty() {
            return Ok(0);
        }

        let dialect = self.dialect_for(self.executor.provider_id())?;

        let mut affected_rows = 0;
        let mut offset = 0;
        for batch in batches {
            let modified = modifications.batch(offset, batch.len());
            offset += batch.len();

            let statement = build_update(&model, batch, properties, modified, dialect.as_ref())?;
            if statement.is_noop() {
                continue;
            }

            debug!("bulk update statement: {}", statement.query);
            affected_rows += self.executor.execute(&statement.query, &statement.parameters)?;
        }

        Ok(affected_rows)
    }
}
