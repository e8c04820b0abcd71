//! Subscriber setup shared by every binary of the workspace.

pub mod filter;
pub mod logging;
pub mod panic;

// crates
use serde::{Deserialize, Serialize};
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};
// internal
use crate::filter::{create_envfilter_layer, EnvFilterConfig};
use crate::logging::{create_file_layer, create_writer_layer, FileConfig, SharedWriter};

pub use tracing_appender::non_blocking::WorkerGuard;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Base = Layered<LevelFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoggerLayer {
    File(FileConfig),
    Stdout,
    Stderr,
    #[serde(skip)]
    Writer(SharedWriter),
    // do not collect logs
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FilterLayer {
    EnvFilter(EnvFilterConfig),
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracingSettings {
    pub logger: LoggerLayer,
    pub filter: FilterLayer,
    #[serde(with = "serde_level")]
    pub level: Level,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            logger: LoggerLayer::Stdout,
            filter: FilterLayer::None,
            level: Level::INFO,
        }
    }
}

/// Builds the subscriber described by `settings` without installing it.
///
/// The returned guard, if any, must outlive the subscriber or buffered lines are lost.
pub fn subscriber(
    settings: &TracingSettings,
) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>), DynError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let guard = match &settings.logger {
        LoggerLayer::File(config) => {
            let (layer, guard) = create_file_layer(config.clone());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::Stdout => {
            let (layer, guard) = create_writer_layer(std::io::stdout());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::Stderr => {
            let (layer, guard) = create_writer_layer(std::io::stderr());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::Writer(writer) => {
            let (layer, guard) = create_writer_layer(writer.clone());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::None => None,
    };

    if let FilterLayer::EnvFilter(config) = &settings.filter {
        layers.push(Box::new(create_envfilter_layer(config)?));
    }

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(settings.level))
        .with(layers);
    Ok((subscriber, guard))
}

/// Installs the global subscriber and routes panics through it.
///
/// Fails if a global subscriber is already set.
pub fn init(settings: &TracingSettings) -> Result<Option<WorkerGuard>, DynError> {
    let (subscriber, guard) = subscriber(settings)?;
    subscriber.try_init()?;
    std::panic::set_hook(Box::new(panic::panic_hook));
    Ok(guard)
}

mod serde_level {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use super::Level;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).and_then(|v| {
            v.parse()
                .map_err(|e| D::Error::custom(format!("invalid log level {e}")))
        })
    }

    pub fn serialize<S>(value: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.as_str().serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn captured(settings_for: impl FnOnce(SharedWriter) -> TracingSettings) -> String {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let writer = SharedWriter::from_inner(buffer.clone());
        let (subscriber, guard) = subscriber(&settings_for(writer)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "tessera_eds::cache", "Evicted accessor");
            tracing::info!(target: "tessera_eds::cache", "Loaded accessor");
            tracing::info!(target: "tessera_storage", height = 7, "Stored headers");
        });
        drop(guard);
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_level_filters_events() {
        let logs = captured(|writer| TracingSettings {
            logger: LoggerLayer::Writer(writer),
            filter: FilterLayer::None,
            level: Level::INFO,
        });
        assert!(logs.contains("Loaded accessor"));
        assert!(logs.contains("height=7"));
        assert!(!logs.contains("Evicted accessor"));
    }

    #[test]
    fn test_env_filter_narrows_targets() {
        let logs = captured(|writer| TracingSettings {
            logger: LoggerLayer::Writer(writer),
            filter: FilterLayer::EnvFilter(EnvFilterConfig {
                filters: [("tessera_eds".to_string(), "debug".to_string())].into(),
            }),
            level: Level::DEBUG,
        });
        assert!(logs.contains("Evicted accessor"));
        assert!(!logs.contains("Stored headers"));
    }

    #[test]
    fn test_settings_yaml() {
        let settings: TracingSettings = serde_yaml::from_str(
            "logger: !File\n  directory: /var/log/tessera\n  prefix: null\nfilter: None\nlevel: WARN\n",
        )
        .unwrap();
        assert_eq!(settings.level, Level::WARN);
        assert!(matches!(settings.logger, LoggerLayer::File(_)));
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(yaml.contains("level: WARN"));
    }
}
