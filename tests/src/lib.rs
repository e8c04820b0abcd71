// std
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
// crates
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tessera_blob_service::TxSubmitter;
use tessera_core::header::HeaderHash;
use tessera_core::testutils::build_eds;
use tessera_core::{Blob, DynError, ExtendedDataSquare, ExtendedHeader};
use tessera_node::{Config, Node};

pub use tessera_core::testutils::{namespace, random_blob};

pub type TestNode = Node<RecordingSubmitter>;

pub fn rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Accepts every submission and includes it at the next height.
#[derive(Default)]
pub struct RecordingSubmitter {
    height: AtomicU64,
    pub submitted: Mutex<Vec<(u64, u64, Vec<Blob>)>>,
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
            .push((fee, gas_limit, blobs.to_vec()));
        Ok(self.height.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// A chain of headers whose squares are built from the given blobs.
pub struct Chain {
    pub blocks: Vec<(ExtendedHeader, ExtendedDataSquare)>,
}

impl Chain {
    pub fn new(blocks: Vec<Vec<Blob>>) -> Self {
        let mut last_hash = HeaderHash::default();
        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(index, blobs)| {
                let (square, root) = build_eds(blobs);
                let header = ExtendedHeader::new(index as u64 + 1, index as u64, last_hash, root);
                last_hash = header.hash();
                (header, square)
            })
            .collect();
        Self { blocks }
    }

    pub fn header(&self, height: u64) -> &ExtendedHeader {
        &self.blocks[height as usize - 1].0
    }

    pub async fn import_into(&self, node: &TestNode) {
        for (header, square) in &self.blocks {
            node.import(header, square).await.unwrap();
        }
    }
}

pub fn node_config(dir: &Path) -> Config {
    Config::with_data_dir(dir)
}

pub fn spawn_node(config: Config) -> (TestNode, Arc<RecordingSubmitter>) {
    let submitter = Arc::new(RecordingSubmitter::default());
    let node = Node::new(config, Arc::clone(&submitter)).unwrap();
    (node, submitter)
}
