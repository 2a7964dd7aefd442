//! CSV import of tax bracket tables.

mod loader;

pub use loader::{BracketLoader, BracketLoaderError, BracketRecord};
