use std::{collections::HashMap, sync::Arc};

use crate::dialect::{DialectStrategy, GenericDialect, ReturningDialect};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProviderRegistryError {
    #[error("a dialect is already registered for provider '{0}'")]
    AlreadyRegistered(String),

    #[error("no dialect registered for provider '{0}'")]
    UnsupportedProvider(String),
}

/// Maps a database provider identifier to the dialect strategy that shapes
/// its statements. Populated once at startup and read-only afterwards, so
/// lookups need no locking. Construct one per engine (or per test) rather
/// than sharing process-wide state.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    schemes: HashMap<String, Arc<dyn DialectStrategy>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the stock providers: `postgres` and
    /// `sqlite` speak `RETURNING`, `mysql` and `mssql` get the generic
    /// dialect.
    pub fn with_default_schemes() -> Self {
        let mut registry = Self::new();

        let returning: Arc<dyn DialectStrategy> = Arc::new(ReturningDialect);
        let generic: Arc<dyn DialectStrategy> = Arc::new(GenericDialect);

        for provider in ["postgres", "sqlite"] {
            registry.schemes.insert(provider.to_string(), returning.clone());
        }
        for provider in ["mysql", "mssql"] {
            registry.schemes.insert(provider.to_string(), generic.clone());
        }

        registry
    }

    pub fn register(
        &mut self,
        provider_id: impl Into<String>,
        dialect: Arc<dyn DialectStrategy>,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = provider_id.into();
        if self.schemes.contains_key(&provider_id) {
            return Err(ProviderRegistryError::AlreadyRegistered(provider_id));
        }

        self.schemes.insert(provider_id, dialect);
        Ok(())
    }

    pub fn resolve(&self, provider_id: &str) -> Result<Arc<dyn DialectStrategy>, ProviderRegistryError> {
        self.schemes
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderRegistryError::UnsupportedProvider(provider_id.to_string()))
    }
}
