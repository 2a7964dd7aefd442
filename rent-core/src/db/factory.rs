//! Backend selection for the household and tax-table store.
//!
//! A binary registers the backends it links against, then opens whichever
//! one the resolved settings name.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{RentRepository, RepositoryError};

/// Which backend to open and how to reach it. For `sqlite` the connection
/// string is a file path or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens a ready-to-use [`RentRepository`] for one backend. Migrations and
/// reference seeds run inside `create`.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn create(&self, config: &DbConfig) -> Result<Box<dyn RentRepository>, RepositoryError>;
}

/// Backend factories keyed by [`RepositoryFactory::backend_name`].
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any earlier one with the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the backend named by `config.backend`.
    ///
    /// An unregistered name is a [`RepositoryError::Configuration`] that
    /// lists the names that are registered. Errors from the factory itself
    /// pass through unchanged.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn RentRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            )));
        };

        debug!(
            backend = %config.backend,
            database = %config.connection_string,
            "opening repository"
        );
        factory.create(config).await
    }
}
