// crates
use tessera_core::namespace::NAMESPACE_SIZE;
use tessera_core::{Blob, DynError};
// internal
use crate::BlobServiceSettings;

/// Carries a pay for blobs transaction to the chain.
#[async_trait::async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Submits every blob in one transaction and returns the height it was included at.
    async fn submit_pay_for_blobs(
        &self,
        fee: u64,
        gas_limit: u64,
        blobs: &[Blob],
    ) -> Result<u64, DynError>;
}

/// Gas needed to pay for `blobs`: a per byte cost over namespace and data plus a fixed cost.
pub fn estimate_gas(settings: &BlobServiceSettings, blobs: &[Blob]) -> u64 {
    let bytes: u64 = blobs
        .iter()
        .map(|blob| (blob.data.len() + NAMESPACE_SIZE) as u64)
        .sum();
    settings.gas_per_blob_byte * bytes + settings.pfb_gas_fixed_cost
}

pub fn fee(settings: &BlobServiceSettings, gas_limit: u64) -> u64 {
    (settings.min_gas_price * gas_limit as f64).floor() as u64
}

#[cfg(test)]
mod test {
    use super::*;
    use tessera_core::testutils::namespace;

    #[test]
    fn test_gas_and_fee() {
        let settings = BlobServiceSettings::default();
        let blobs = [
            Blob::new(namespace(1), vec![0; 100]).unwrap(),
            Blob::new(namespace(2), vec![0; 892]).unwrap(),
        ];
        let gas = estimate_gas(&settings, &blobs);
        assert_eq!(gas, 8 * 1008 + 75_000);
        assert_eq!(fee(&settings, gas), 83);
        assert_eq!(estimate_gas(&settings, &[]), 75_000);
    }
}
