// std
use std::collections::BTreeMap;
// crates
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
// internal
use crate::DynError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvFilterConfig {
    /// Target (crate or module path) to level, joined into `EnvFilter` directives.
    /// See <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives>
    pub filters: BTreeMap<String, String>,
}

impl EnvFilterConfig {
    pub fn directives(&self) -> String {
        self.filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn create_envfilter_layer(config: &EnvFilterConfig) -> Result<EnvFilter, DynError> {
    Ok(EnvFilter::try_new(config.directives())?)
}
