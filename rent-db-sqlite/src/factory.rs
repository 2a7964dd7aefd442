use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use rent_core::db::{DbConfig, RentRepository, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`RENT_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as last resort (dev/tests run from the
///    build tree).
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RENT_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`rent_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use rent_core::db::RepositoryRegistry;
/// use rent_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, then apply
    /// migrations and seeds.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"rent.db"`. The file is created if it
    ///   does not exist.
    /// * A `sqlite:` URL.
    /// * `":memory:"` for an ephemeral in-memory database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn RentRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        debug!(seeds = %seeds.display(), "applying sqlite seeds");
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rent_core::db::{DbConfig, RepositoryFactory};

    use super::SqliteRepositoryFactory;

    fn memory_config() -> DbConfig {
        DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    /// Full round-trip: factory → SqliteRepository with an in-memory DB,
    /// seeded with the reference tables.
    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let repo = match SqliteRepositoryFactory.create(&memory_config()).await {
            Ok(repo) => repo,
            Err(e) => panic!("failed to create in-memory repository: {e}"),
        };

        let years = repo.list_tax_years().await.expect("Should list tax years");
        assert_eq!(years, vec![2025]);

        let config = repo
            .load_jurisdiction_config(2025, "BC")
            .await
            .expect("Should load seeded config");
        assert_eq!(config.provincial.schedule.brackets().len(), 7);
    }

    #[tokio::test]
    async fn unreachable_path_is_connection_error() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: "/nonexistent-dir/for/sure/rent.db".to_string(),
        };

        let result = SqliteRepositoryFactory.create(&config).await;

        assert!(matches!(
            result.err(),
            Some(rent_core::RepositoryError::Connection(_))
        ));
    }
}
