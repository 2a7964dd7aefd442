//! Process-wide holder for the active tax configuration.
//!
//! Readers take an `Arc` snapshot and compute against it without holding
//! any lock. Reconfiguration swaps the whole [`JurisdictionTaxConfig`] at
//! once, so a reader sees either the old table or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::JurisdictionTaxConfig;

#[derive(Debug)]
pub struct SharedTaxConfig {
    current: RwLock<Arc<JurisdictionTaxConfig>>,
}

impl SharedTaxConfig {
    pub fn new(config: JurisdictionTaxConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the configuration in effect right now.
    pub fn current(&self) -> Arc<JurisdictionTaxConfig> {
        // The guarded value is a single Arc; a poisoned lock still holds a
        // complete configuration.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the configuration and returns the previous one.
    pub fn replace(
        &self,
        config: JurisdictionTaxConfig,
    ) -> Arc<JurisdictionTaxConfig> {
        info!(
            tax_year = config.tax_year,
            region = %config.region,
            "replacing active tax configuration"
        );
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(config))
    }
}

impl Default for SharedTaxConfig {
    fn default() -> Self {
        Self::new(JurisdictionTaxConfig::reference())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::compute_take_home;

    fn config_for_year(tax_year: i32) -> JurisdictionTaxConfig {
        JurisdictionTaxConfig {
            tax_year,
            ..JurisdictionTaxConfig::reference()
        }
    }

    #[test]
    fn default_holds_reference_config() {
        let shared = SharedTaxConfig::default();

        assert_eq!(*shared.current(), JurisdictionTaxConfig::reference());
    }

    #[test]
    fn replace_returns_previous_config() {
        let shared = SharedTaxConfig::new(config_for_year(2024));

        let previous = shared.replace(config_for_year(2025));

        assert_eq!(previous.tax_year, 2024);
        assert_eq!(shared.current().tax_year, 2025);
    }

    #[test]
    fn snapshot_survives_replacement() {
        let shared = SharedTaxConfig::new(config_for_year(2024));
        let snapshot = shared.current();

        shared.replace(config_for_year(2025));

        assert_eq!(snapshot.tax_year, 2024);
        assert_eq!(
            compute_take_home(dec!(75000), &snapshot).monthly_take_home,
            dec!(5111)
        );
    }

    #[test]
    fn concurrent_readers_see_whole_configs() {
        let shared = Arc::new(SharedTaxConfig::new(config_for_year(2024)));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let config = shared.current();
                        assert!(config.tax_year == 2024 || config.tax_year == 2025);
                        assert_eq!(config.federal.schedule.brackets().len(), 5);
                    }
                })
            })
            .collect();

        for year in [2025, 2024, 2025] {
            shared.replace(config_for_year(year));
        }

        for reader in readers {
            reader.join().expect("reader thread panicked");
        }
    }
}
