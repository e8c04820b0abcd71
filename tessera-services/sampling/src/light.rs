// std
use std::sync::{Arc, Mutex, PoisonError};
// crates
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tessera_core::getter::ShareGetter;
use tessera_core::{Axis, Root};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, warn};
// internal
use crate::{Availability, AvailabilityError, SamplingSettings};

/// One coordinate of the extended square picked for sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sample {
    pub row: usize,
    pub col: usize,
}

impl Sample {
    /// Samples on an even diagonal are proven through their row, the rest through their column.
    pub fn axis(&self) -> Axis {
        if (self.row + self.col) % 2 == 0 {
            Axis::Row
        } else {
            Axis::Col
        }
    }
}

/// Picks `amount` distinct coordinates of a `width` x `width` square, or all of them if the
/// square is smaller than that.
pub fn select_samples<R: Rng + ?Sized>(rng: &mut R, width: usize, amount: usize) -> Vec<Sample> {
    let total = width * width;
    index::sample(rng, total, amount.min(total))
        .into_iter()
        .map(|position| Sample {
            row: position / width,
            col: position % width,
        })
        .collect()
}

enum SampleOutcome {
    Available,
    Missing,
    TimedOut,
    Invalid,
    Failed(AvailabilityError),
}

/// Availability through random sampling of the extended square.
pub struct LightAvailability<Getter> {
    getter: Arc<Getter>,
    settings: SamplingSettings,
    rng: Mutex<ChaCha20Rng>,
}

impl<Getter> LightAvailability<Getter>
where
    Getter: ShareGetter + 'static,
{
    pub fn new(getter: Arc<Getter>, settings: SamplingSettings) -> Self {
        Self::with_rng(getter, settings, ChaCha20Rng::from_entropy())
    }

    pub fn with_rng(getter: Arc<Getter>, settings: SamplingSettings, rng: ChaCha20Rng) -> Self {
        Self {
            getter,
            settings,
            rng: Mutex::new(rng),
        }
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    fn samples(&self, width: usize) -> Vec<Sample> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        select_samples(&mut *rng, width, self.settings.sample_amount)
    }
}

#[async_trait::async_trait]
impl<Getter> Availability for LightAvailability<Getter>
where
    Getter: ShareGetter + 'static,
{
    /// # Panics
    ///
    /// If `root` is malformed. Roots must be validated before they are sampled.
    async fn shares_available(&self, root: &Root) -> Result<(), AvailabilityError> {
        if let Err(e) = root.validate_basic() {
            error!(error = %e, root = ?root, "Sampling requested for an invalid root");
            panic!("sampling requested for an invalid root: {e}");
        }

        let samples = self.samples(root.width());
        let deadline = Instant::now() + self.settings.timeout;
        let shared_root = Arc::new(root.clone());
        let mut tasks = JoinSet::new();
        for (slot, sample) in samples.iter().copied().enumerate() {
            let getter = Arc::clone(&self.getter);
            let root = Arc::clone(&shared_root);
            tasks.spawn(async move {
                let fetch = getter.get_share_with_proof(&root, sample.row, sample.col, sample.axis());
                let outcome = match timeout_at(deadline, fetch).await {
                    Err(_) => SampleOutcome::TimedOut,
                    Ok(Ok(share)) if share.validate(&root, sample.row, sample.col) => {
                        SampleOutcome::Available
                    }
                    Ok(Ok(_)) => SampleOutcome::Invalid,
                    Ok(Err(e)) if e.is_not_found() => SampleOutcome::Missing,
                    Ok(Err(e)) => SampleOutcome::Failed(AvailabilityError::Getter(e)),
                };
                (slot, outcome)
            });
        }

        let mut outcomes: Vec<Option<SampleOutcome>> = samples.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (slot, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tasks.abort_all();
                    return Err(AvailabilityError::Task(e.to_string()));
                }
            };
            if let SampleOutcome::Failed(e) = outcome {
                let sample = samples[slot];
                error!(error = %e, row = sample.row, col = sample.col, "Sampling failed");
                tasks.abort_all();
                return Err(e);
            }
            outcomes[slot] = Some(outcome);
        }

        let mut unavailable = 0usize;
        for (sample, outcome) in samples.iter().zip(outcomes) {
            match outcome {
                Some(SampleOutcome::Available) => {}
                Some(SampleOutcome::Invalid) => {
                    warn!(row = sample.row, col = sample.col, "Sample does not match its root");
                    unavailable += 1;
                }
                Some(SampleOutcome::TimedOut) => {
                    debug!(row = sample.row, col = sample.col, "Sample timed out");
                    unavailable += 1;
                }
                _ => {
                    debug!(row = sample.row, col = sample.col, "Sample not found");
                    unavailable += 1;
                }
            }
        }

        if unavailable > 0 {
            debug!(
                root = %root.hash_hex(),
                samples = samples.len(),
                unavailable,
                "Data is not available"
            );
            return Err(AvailabilityError::NotAvailable);
        }
        debug!(root = %root.hash_hex(), samples = samples.len(), "Data is available");
        Ok(())
    }
}
