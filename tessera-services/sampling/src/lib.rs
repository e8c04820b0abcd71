pub mod cache;
pub mod full;
pub mod light;

// std
use std::time::Duration;
// crates
use serde::{Deserialize, Serialize};
use tessera_core::eds::EdsError;
use tessera_core::getter::GetterError;
use tessera_core::Root;
use tessera_storage::StorageError;
// internal
pub use cache::CachedAvailability;
pub use full::FullAvailability;
pub use light::LightAvailability;

/// Odds that a single sample lands on an available share of a square withheld just enough to
/// be unrecoverable.
const SAMPLE_HIT_PROBABILITY: f64 = 0.75;

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("data is not available")]
    NotAvailable,
    #[error(transparent)]
    Getter(GetterError),
    #[error(transparent)]
    Eds(#[from] EdsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("sampling task failed: {0}")]
    Task(String),
}

impl AvailabilityError {
    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }
}

/// Decides whether the square committed to by a root can be retrieved.
#[async_trait::async_trait]
pub trait Availability: Send + Sync {
    /// `Ok(())` when the data is available, [`AvailabilityError::NotAvailable`] when it is not.
    async fn shares_available(&self, root: &Root) -> Result<(), AvailabilityError>;
}

#[async_trait::async_trait]
impl<A: Availability + ?Sized> Availability for std::sync::Arc<A> {
    async fn shares_available(&self, root: &Root) -> Result<(), AvailabilityError> {
        (**self).shares_available(root).await
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("false negative probability {0} is outside (0, 1]")]
pub struct InvalidProbability(pub f64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Coordinates probed per root.
    pub sample_amount: usize,
    /// Time allowed for the whole batch of samples.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl SamplingSettings {
    /// Enough samples to miss an unrecoverable square with probability at most `probability`.
    pub fn from_false_negative_probability(probability: f64) -> Result<Self, InvalidProbability> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(InvalidProbability(probability));
        }
        let samples = (probability.ln() / SAMPLE_HIT_PROBABILITY.ln()).ceil();
        Ok(Self {
            sample_amount: (samples as usize).max(1),
            ..Self::default()
        })
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            sample_amount: 16,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullAvailabilitySettings {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for FullAvailabilitySettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}
