// std
use std::sync::Arc;
// crates
use tessera_core::getter::ShareGetter;
use tessera_core::Root;
use tokio::time::timeout;
use tracing::{debug, warn};
// internal
use crate::{Availability, AvailabilityError, FullAvailabilitySettings};

/// Availability by downloading the whole square and recomputing its root.
pub struct FullAvailability<Getter> {
    getter: Arc<Getter>,
    settings: FullAvailabilitySettings,
}

impl<Getter: ShareGetter> FullAvailability<Getter> {
    pub fn new(getter: Arc<Getter>, settings: FullAvailabilitySettings) -> Self {
        Self { getter, settings }
    }
}

#[async_trait::async_trait]
impl<Getter: ShareGetter> Availability for FullAvailability<Getter> {
    async fn shares_available(&self, root: &Root) -> Result<(), AvailabilityError> {
        let eds = match timeout(self.settings.timeout, self.getter.get_eds(root)).await {
            Err(_) => {
                debug!(root = %root.hash_hex(), "Timed out retrieving square");
                return Err(AvailabilityError::NotAvailable);
            }
            Ok(Err(e)) if e.is_not_found() => {
                debug!(root = %root.hash_hex(), "Square not found");
                return Err(AvailabilityError::NotAvailable);
            }
            Ok(Err(e)) => return Err(AvailabilityError::Getter(e)),
            Ok(Ok(eds)) => eds,
        };
        if &Root::from_eds(&eds)? != root {
            warn!(root = %root.hash_hex(), "Retrieved square does not match its root");
            return Err(AvailabilityError::NotAvailable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use tessera_core::testutils::{build_eds, namespace, random_blob, MemoryShareGetter};

    #[tokio::test]
    async fn test_full_availability() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let (eds, _) = build_eds(vec![random_blob(&mut rng, namespace(4), 1500)]);
        let getter = Arc::new(MemoryShareGetter::new());
        let root = getter.insert(eds);
        let full = FullAvailability::new(Arc::clone(&getter), FullAvailabilitySettings::default());
        full.shares_available(&root).await.unwrap();

        // a single missing share is enough to fail a full download
        getter.withhold(0, 0);
        assert!(full
            .shares_available(&root)
            .await
            .unwrap_err()
            .is_not_available());
    }
}
