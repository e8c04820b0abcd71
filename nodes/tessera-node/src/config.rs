// std
use std::path::{Path, PathBuf};
use std::time::Duration;
// crates
use serde::{Deserialize, Serialize};
use tessera_blob_service::BlobServiceSettings;
use tessera_da_sampling::{FullAvailabilitySettings, SamplingSettings};
use tessera_eds::cache::AccessorCacheSettings;
use tessera_eds::EdsStoreSettings;
use tessera_nmt::NmtSettings;
use tessera_storage::HeightIndexerSettings;
use tessera_tracing::TracingSettings;
// internal

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// How the node decides a root is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityMode {
    #[default]
    Light,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the header and sampling databases.
    pub db_path: PathBuf,
    pub height_index: HeightIndexerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracing: TracingSettings,
    pub nmt: NmtSettings,
    pub storage: StorageSettings,
    pub eds: EdsStoreSettings,
    pub availability: AvailabilityMode,
    pub sampling: SamplingSettings,
    pub full_availability: FullAvailabilitySettings,
    pub blob: BlobServiceSettings,
}

impl Config {
    /// Default settings with every on-disk location under `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            tracing: TracingSettings::default(),
            nmt: NmtSettings::default(),
            storage: StorageSettings {
                db_path: data_dir.join("db"),
                height_index: HeightIndexerSettings::default(),
            },
            eds: EdsStoreSettings {
                base_dir: data_dir.join("blocks"),
                cache: AccessorCacheSettings::default(),
            },
            availability: AvailabilityMode::default(),
            sampling: SamplingSettings::default(),
            full_availability: FullAvailabilitySettings::default(),
            blob: BlobServiceSettings::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_reader(std::fs::File::open(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.nmt
            .validate()
            .map_err(|reason| ConfigError::invalid("nmt.namespace_size", reason))?;
        if self.sampling.sample_amount == 0 {
            return Err(ConfigError::invalid(
                "sampling.sample_amount",
                "at least one sample is required",
            ));
        }
        non_zero("sampling.timeout", self.sampling.timeout)?;
        non_zero("full_availability.timeout", self.full_availability.timeout)?;
        if self.eds.cache.capacity == 0 {
            return Err(ConfigError::invalid("eds.cache.capacity", "must be positive"));
        }
        if self.storage.height_index.cache_size == 0 {
            return Err(ConfigError::invalid(
                "storage.height_index.cache_size",
                "must be positive",
            ));
        }
        let price = self.blob.min_gas_price;
        if !price.is_finite() || price < 0.0 {
            return Err(ConfigError::invalid(
                "blob.min_gas_price",
                format!("{price} is not a valid price"),
            ));
        }
        Ok(())
    }
}

fn non_zero(field: &'static str, duration: Duration) -> Result<(), ConfigError> {
    if duration.is_zero() {
        return Err(ConfigError::invalid(field, "must be longer than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_data_dir(dir.path());
        config.availability = AvailabilityMode::Full;
        config.sampling = SamplingSettings::from_false_negative_probability(0.001).unwrap();
        let path = dir.path().join("config.yaml");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.availability, AvailabilityMode::Full);
        assert_eq!(loaded.sampling, config.sampling);
        assert_eq!(loaded.eds, config.eds);
        assert_eq!(loaded.storage, config.storage);
        assert_eq!(loaded.blob, config.blob);
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::with_data_dir(dir.path());
        config.nmt.namespace_size = 29;
        config.save(&path).unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Invalid {
                field: "nmt.namespace_size",
                ..
            })
        ));

        let mut config = Config::with_data_dir(dir.path());
        config.sampling.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::with_data_dir(dir.path());
        config.blob.min_gas_price = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/tessera/config.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
