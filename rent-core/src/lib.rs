pub mod cache;
pub mod calculations;
pub mod config_handle;
pub mod db;
pub mod models;

pub use cache::{RecommendationCache, preferences_hash};
pub use config_handle::SharedTaxConfig;
pub use db::repository::{LevelSettings, RentRepository, RepositoryError};
pub use models::*;
