pub mod proof;
pub mod reconstruct;
pub mod submit;

// std
use std::fmt::{Display, Formatter};
use std::sync::Arc;
// crates
use serde::{Deserialize, Serialize};
use tessera_core::blob::BlobBuildError;
use tessera_core::getter::{GetterError, HeaderGetter, ShareGetter};
use tessera_core::header::ExtendedHeader;
use tessera_core::share::ShareError;
use tessera_core::{Blob, Commitment, DynError, Namespace, Root};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, Instrument};
// internal
pub use proof::BlobProof;
use reconstruct::{all_blobs, find_by_commitment};
pub use submit::{estimate_gas, fee, TxSubmitter};

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob: not found")]
    NotFound,
    #[error("blob: invalid proof")]
    InvalidProof,
    #[error("no header at height {0}")]
    HeaderNotFound(u64),
    #[error("nothing to submit")]
    NoBlobs,
    #[error(transparent)]
    Getter(GetterError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Blob(#[from] BlobBuildError),
    #[error("getting blobs for namespace {namespace}: {source}")]
    Namespace {
        namespace: Namespace,
        #[source]
        source: Box<BlobError>,
    },
    #[error("{}", AggregateDisplay(.0))]
    Aggregate(Vec<BlobError>),
    #[error("lookup task failed: {0}")]
    Task(String),
    #[error("submission failed: {0}")]
    Submit(DynError),
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound | Self::HeaderNotFound(_) => true,
            Self::Namespace { source, .. } => source.is_not_found(),
            Self::Aggregate(errors) => errors.iter().all(BlobError::is_not_found),
            _ => false,
        }
    }
}

impl From<GetterError> for BlobError {
    fn from(e: GetterError) -> Self {
        if e.is_not_found() {
            Self::NotFound
        } else {
            Self::Getter(e)
        }
    }
}

struct AggregateDisplay<'a>(&'a [BlobError]);

impl Display for AggregateDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobServiceSettings {
    pub min_gas_price: f64,
    pub gas_per_blob_byte: u64,
    pub pfb_gas_fixed_cost: u64,
}

impl Default for BlobServiceSettings {
    fn default() -> Self {
        Self {
            min_gas_price: 0.001,
            gas_per_blob_byte: 8,
            pfb_gas_fixed_cost: 75_000,
        }
    }
}

/// Blobs found by [`BlobService::get_all`] and the lookups that failed along the way.
#[derive(Debug, Default)]
pub struct GetAllResponse {
    pub blobs: Vec<Blob>,
    pub errors: Vec<BlobError>,
}

pub struct BlobService<Headers, Shares, Submitter> {
    headers: Arc<Headers>,
    shares: Arc<Shares>,
    submitter: Arc<Submitter>,
    settings: BlobServiceSettings,
}

impl<Headers, Shares, Submitter> BlobService<Headers, Shares, Submitter>
where
    Headers: HeaderGetter + 'static,
    Shares: ShareGetter + 'static,
    Submitter: TxSubmitter + 'static,
{
    pub fn new(
        headers: Arc<Headers>,
        shares: Arc<Shares>,
        submitter: Arc<Submitter>,
        settings: BlobServiceSettings,
    ) -> Self {
        Self {
            headers,
            shares,
            submitter,
            settings,
        }
    }

    pub fn settings(&self) -> &BlobServiceSettings {
        &self.settings
    }

    /// Submits `blobs` atomically and returns the height they were included at.
    pub async fn submit(&self, blobs: &[Blob]) -> Result<u64, BlobError> {
        if blobs.is_empty() {
            return Err(BlobError::NoBlobs);
        }
        let gas_limit = estimate_gas(&self.settings, blobs);
        let fee = fee(&self.settings, gas_limit);
        debug!(amount = blobs.len(), gas_limit, fee, "Submitting blobs");
        let height = self
            .submitter
            .submit_pay_for_blobs(fee, gas_limit, blobs)
            .await
            .map_err(BlobError::Submit)?;
        info!(height, amount = blobs.len(), "Blobs included");
        Ok(height)
    }

    pub async fn get(
        &self,
        height: u64,
        namespace: Namespace,
        commitment: &Commitment,
    ) -> Result<Blob, BlobError> {
        let (blob, _) = self.get_by_commitment(height, namespace, commitment).await?;
        Ok(blob)
    }

    pub async fn get_proof(
        &self,
        height: u64,
        namespace: Namespace,
        commitment: &Commitment,
    ) -> Result<BlobProof, BlobError> {
        let (_, proof) = self.get_by_commitment(height, namespace, commitment).await?;
        Ok(proof)
    }

    /// Every blob of every namespace at `height`, one lookup per namespace running concurrently.
    ///
    /// Fails only when no namespace yielded a blob, with every lookup error and a final
    /// [`BlobError::NotFound`].
    pub async fn get_all(
        &self,
        height: u64,
        namespaces: &[Namespace],
    ) -> Result<GetAllResponse, BlobError> {
        let header = self.header(height).await?;
        let mut lookups = JoinSet::new();
        for (index, namespace) in namespaces.iter().copied().enumerate() {
            let shares = Arc::clone(&self.shares);
            let root = header.dah.clone();
            lookups.spawn(
                async move { (index, Self::blobs_of(&*shares, &root, namespace).await) }
                    .instrument(info_span!("get_all", height, %namespace)),
            );
        }

        let mut slots: Vec<Option<Result<Vec<Blob>, BlobError>>> =
            (0..namespaces.len()).map(|_| None).collect();
        while let Some(joined) = lookups.join_next().await {
            let (index, result) = joined.map_err(|e| BlobError::Task(e.to_string()))?;
            slots[index] = Some(result);
        }

        let mut response = GetAllResponse::default();
        for (namespace, slot) in namespaces.iter().zip(slots) {
            match slot {
                Some(Ok(blobs)) => response.blobs.extend(blobs),
                Some(Err(e)) => response.errors.push(BlobError::Namespace {
                    namespace: *namespace,
                    source: Box::new(e),
                }),
                None => {}
            }
        }
        if response.blobs.is_empty() {
            response.errors.push(BlobError::NotFound);
            return Err(BlobError::Aggregate(response.errors));
        }
        Ok(response)
    }

    /// Whether the blob of `commitment` is included at `height` with exactly `proof`.
    pub async fn included(
        &self,
        height: u64,
        namespace: Namespace,
        proof: &BlobProof,
        commitment: &Commitment,
    ) -> Result<bool, BlobError> {
        match self.get_by_commitment(height, namespace, commitment).await {
            Ok((_, found)) if &found == proof => Ok(true),
            Ok(_) => Err(BlobError::InvalidProof),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_by_commitment(
        &self,
        height: u64,
        namespace: Namespace,
        commitment: &Commitment,
    ) -> Result<(Blob, BlobProof), BlobError> {
        info!(height, %namespace, "Requesting blob");
        let header = self.header(height).await?;
        let namespaced = self
            .shares
            .get_shares_by_namespace(&header.dah, &namespace)
            .await?;
        find_by_commitment(namespaced, commitment)
    }

    async fn blobs_of(
        shares: &Shares,
        root: &Root,
        namespace: Namespace,
    ) -> Result<Vec<Blob>, BlobError> {
        let namespaced = shares.get_shares_by_namespace(root, &namespace).await?;
        all_blobs(&namespaced)
    }

    async fn header(&self, height: u64) -> Result<ExtendedHeader, BlobError> {
        self.headers
            .get_by_height(height)
            .await
            .map_err(|e| match e {
                GetterError::NotFound => BlobError::HeaderNotFound(height),
                e => BlobError::Getter(e),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;
    use tessera_core::getter::{NamespacedShares, ShareWithProof};
    use tessera_core::testutils::{
        build_eds, namespace, random_blob, MemoryHeaderGetter, MemoryShareGetter,
    };
    use tessera_core::{Axis, ExtendedDataSquare, Share};

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: Mutex<Vec<(u64, u64, usize)>>,
    }

    #[async_trait::async_trait]
    impl TxSubmitter for RecordingSubmitter {
        async fn submit_pay_for_blobs(
            &self,
            fee: u64,
            gas_limit: u64,
            blobs: &[Blob],
        ) -> Result<u64, DynError> {
            self.submitted
                .lock()
                .unwrap()
                .push((fee, gas_limit, blobs.len()));
            Ok(10)
        }
    }

    type Service = BlobService<MemoryHeaderGetter, MemoryShareGetter, RecordingSubmitter>;

    fn service(blobs: Vec<Blob>) -> Service {
        let (eds, root) = build_eds(blobs);
        let shares = MemoryShareGetter::new();
        shares.insert(eds);
        let headers = MemoryHeaderGetter::new();
        headers.insert(ExtendedHeader::new(1, 1_700_000_000, [0; 32], root));
        BlobService::new(
            Arc::new(headers),
            Arc::new(shares),
            Arc::new(RecordingSubmitter::default()),
            BlobServiceSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_get_and_included() {
        let mut rng = rand::thread_rng();
        let blob = random_blob(&mut rng, namespace(1), 900);
        let service = service(vec![blob.clone()]);
        let found = service
            .get(1, blob.namespace, &blob.commitment)
            .await
            .unwrap();
        assert_eq!(found, blob);
        let proof = service
            .get_proof(1, blob.namespace, &blob.commitment)
            .await
            .unwrap();
        assert!(service
            .included(1, blob.namespace, &proof, &blob.commitment)
            .await
            .unwrap());
        assert!(matches!(
            service
                .included(1, blob.namespace, &BlobProof::default(), &blob.commitment)
                .await,
            Err(BlobError::InvalidProof)
        ));
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut rng = rand::thread_rng();
        let blob = random_blob(&mut rng, namespace(1), 10);
        let missing = random_blob(&mut rng, namespace(2), 10);
        let service = service(vec![blob.clone()]);
        assert!(service
            .get(1, missing.namespace, &missing.commitment)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            service.get(2, blob.namespace, &blob.commitment).await,
            Err(BlobError::HeaderNotFound(2))
        ));
        assert!(!service
            .included(1, missing.namespace, &BlobProof::default(), &missing.commitment)
            .await
            .unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_all() {
        let mut rng = rand::thread_rng();
        let blobs = vec![
            random_blob(&mut rng, namespace(1), 100),
            random_blob(&mut rng, namespace(1), 700),
            random_blob(&mut rng, namespace(3), 50),
        ];
        let service = service(blobs.clone());
        let response = service
            .get_all(1, &[namespace(1), namespace(2), namespace(3)])
            .await
            .unwrap();
        assert_eq!(response.blobs, blobs);
        assert!(response.errors.is_empty());

        let error = service
            .get_all(1, &[namespace(2), namespace(4)])
            .await
            .unwrap_err();
        let BlobError::Aggregate(errors) = &error else {
            panic!("expected aggregate error, got {error}");
        };
        assert!(matches!(errors.last(), Some(BlobError::NotFound)));
        assert!(error.is_not_found());
    }

    /// Serves shares from memory but fails every lookup of one namespace.
    struct BrokenNamespace {
        inner: MemoryShareGetter,
        broken: Namespace,
    }

    #[async_trait::async_trait]
    impl ShareGetter for BrokenNamespace {
        async fn get_share(&self, root: &Root, row: usize, col: usize) -> Result<Share, GetterError> {
            self.inner.get_share(root, row, col).await
        }

        async fn get_share_with_proof(
            &self,
            root: &Root,
            row: usize,
            col: usize,
            axis: Axis,
        ) -> Result<ShareWithProof, GetterError> {
            self.inner.get_share_with_proof(root, row, col, axis).await
        }

        async fn get_eds(&self, root: &Root) -> Result<ExtendedDataSquare, GetterError> {
            self.inner.get_eds(root).await
        }

        async fn get_shares_by_namespace(
            &self,
            root: &Root,
            namespace: &Namespace,
        ) -> Result<NamespacedShares, GetterError> {
            if *namespace == self.broken {
                return Err(GetterError::Other("disk read failed".into()));
            }
            self.inner.get_shares_by_namespace(root, namespace).await
        }
    }

    fn broken_service(
        blobs: Vec<Blob>,
        broken: Namespace,
    ) -> BlobService<MemoryHeaderGetter, BrokenNamespace, RecordingSubmitter> {
        let (eds, root) = build_eds(blobs);
        let inner = MemoryShareGetter::new();
        inner.insert(eds);
        let headers = MemoryHeaderGetter::new();
        headers.insert(ExtendedHeader::new(1, 1_700_000_000, [0; 32], root));
        BlobService::new(
            Arc::new(headers),
            Arc::new(BrokenNamespace { inner, broken }),
            Arc::new(RecordingSubmitter::default()),
            BlobServiceSettings::default(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_all_keeps_blobs_of_healthy_namespaces() {
        let mut rng = rand::thread_rng();
        let healthy = random_blob(&mut rng, namespace(1), 600);
        let lost = random_blob(&mut rng, namespace(2), 600);
        let service = broken_service(vec![healthy.clone(), lost], namespace(2));

        let response = service
            .get_all(1, &[namespace(1), namespace(2)])
            .await
            .unwrap();
        assert_eq!(response.blobs, vec![healthy]);
        assert_eq!(response.errors.len(), 1);
        let BlobError::Namespace { namespace: failed, source } = &response.errors[0] else {
            panic!("expected namespace error, got {}", response.errors[0]);
        };
        assert_eq!(*failed, namespace(2));
        assert!(matches!(**source, BlobError::Getter(GetterError::Other(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_all_hard_failure_is_not_not_found() {
        let mut rng = rand::thread_rng();
        let blob = random_blob(&mut rng, namespace(2), 300);
        let service = broken_service(vec![blob], namespace(2));

        let error = service.get_all(1, &[namespace(2)]).await.unwrap_err();
        let BlobError::Aggregate(errors) = &error else {
            panic!("expected aggregate error, got {error}");
        };
        assert_eq!(errors.len(), 2);
        assert!(!errors[0].is_not_found());
        assert!(matches!(errors[1], BlobError::NotFound));
        assert!(!error.is_not_found());
    }

    #[tokio::test]
    async fn test_submit() {
        let mut rng = rand::thread_rng();
        let service = service(vec![]);
        let blobs = vec![random_blob(&mut rng, namespace(1), 92)];
        assert_eq!(service.submit(&blobs).await.unwrap(), 10);
        let submitted = service.submitter.submitted.lock().unwrap().clone();
        assert_eq!(submitted, vec![(75, 75_800, 1)]);
        assert!(matches!(service.submit(&[]).await, Err(BlobError::NoBlobs)));
    }
}
