use std::sync::Arc;
use std::time::Duration;

use tessera_core::testutils::MemoryShareGetter;
use tessera_da_sampling::light::select_samples;
use tessera_da_sampling::{Availability, LightAvailability, SamplingSettings};
use tessera_node::AvailabilityMode;
use tests::{namespace, node_config, random_blob, rng, spawn_node, Chain};

#[tokio::test(flavor = "multi_thread")]
async fn stored_blocks_are_available() {
    let dir = tempfile::tempdir().unwrap();
    for mode in [AvailabilityMode::Light, AvailabilityMode::Full] {
        let mut config = node_config(&dir.path().join(format!("{mode:?}")));
        config.availability = mode;
        let (node, _) = spawn_node(config);
        let mut rng = rng(10);
        let chain = Chain::new(vec![
            vec![random_blob(&mut rng, namespace(1), 4000)],
            vec![
                random_blob(&mut rng, namespace(2), 9000),
                random_blob(&mut rng, namespace(3), 300),
            ],
        ]);
        chain.import_into(&node).await;
        for (header, _) in &chain.blocks {
            node.shares_available(header).await.unwrap();
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_blocks_are_not_available() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _) = spawn_node(node_config(dir.path()));
    let mut rng = rng(11);
    let chain = Chain::new(vec![vec![random_blob(&mut rng, namespace(1), 1000)]]);
    // the header is known but its square never reached the node
    let header = chain.header(1);
    let err = node.shares_available(header).await.unwrap_err();
    assert!(err.is_not_available());
}

#[tokio::test(flavor = "multi_thread")]
async fn withholding_sampled_shares_is_detected() {
    let mut rng = rng(12);
    let chain = Chain::new(vec![vec![random_blob(&mut rng, namespace(4), 20_000)]]);
    let (header, square) = &chain.blocks[0];
    let getter = Arc::new(MemoryShareGetter::new());
    getter.insert(square.clone());

    let settings = SamplingSettings {
        sample_amount: 16,
        timeout: Duration::from_secs(5),
    };
    // a sampler seeded like this one picks the same coordinates
    for sample in select_samples(&mut rng.clone(), header.dah.width(), settings.sample_amount) {
        getter.withhold(sample.row, sample.col);
    }
    let light = LightAvailability::with_rng(getter, settings, rng);
    assert!(light
        .shares_available(&header.dah)
        .await
        .unwrap_err()
        .is_not_available());
}

#[tokio::test(flavor = "multi_thread")]
async fn availability_is_remembered_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = rng(13);
    let chain = Chain::new(vec![vec![random_blob(&mut rng, namespace(7), 2500)]]);
    let header = chain.header(1);

    {
        let (node, _) = spawn_node(node_config(dir.path()));
        chain.import_into(&node).await;
        node.shares_available(header).await.unwrap();
        node.eds.remove(&header.dah).await.unwrap();
    }

    let (node, _) = spawn_node(node_config(dir.path()));
    assert!(!node.eds.has(&header.dah).await);
    node.shares_available(header).await.unwrap();
}
