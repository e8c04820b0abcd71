use tessera_blob_service::{estimate_gas, fee, BlobError};
use tessera_core::Blob;
use tests::{namespace, node_config, random_blob, rng, spawn_node, Chain};

#[tokio::test]
async fn two_share_blob_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _) = spawn_node(node_config(dir.path()));
    let mut rng = rng(1);
    // one first share and one continuation
    let blob = random_blob(&mut rng, namespace(0x21), 600);
    assert_eq!(blob.to_shares().unwrap().len(), 2);
    let chain = Chain::new(vec![vec![blob.clone()]]);
    chain.import_into(&node).await;
    assert_eq!(chain.header(1).dah.width(), 4);

    let found = node
        .blobs
        .get(1, blob.namespace, &blob.commitment)
        .await
        .unwrap();
    assert_eq!(found.data, blob.data);

    let proof = node
        .blobs
        .get_proof(1, blob.namespace, &blob.commitment)
        .await
        .unwrap();
    assert_eq!(proof.len(), 1);
    assert!(node
        .blobs
        .included(1, blob.namespace, &proof, &blob.commitment)
        .await
        .unwrap());
}

#[tokio::test]
async fn blobs_across_heights_and_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _) = spawn_node(node_config(dir.path()));
    let mut rng = rng(2);
    let first = vec![
        random_blob(&mut rng, namespace(1), 3000),
        random_blob(&mut rng, namespace(1), 40),
        random_blob(&mut rng, namespace(3), 1200),
    ];
    let second = vec![random_blob(&mut rng, namespace(1), 5000)];
    let chain = Chain::new(vec![first.clone(), second.clone()]);
    chain.import_into(&node).await;

    for blob in &first {
        assert_eq!(
            &node.blobs.get(1, blob.namespace, &blob.commitment).await.unwrap(),
            blob
        );
    }
    // a commitment from another height is not found here
    let err = node
        .blobs
        .get(1, second[0].namespace, &second[0].commitment)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let all = node
        .blobs
        .get_all(1, &[namespace(1), namespace(3), namespace(9)])
        .await
        .unwrap();
    // namespaces without blobs are skipped silently
    assert_eq!(all.blobs, first);
    assert!(all.errors.is_empty());

    assert!(node
        .blobs
        .get_all(2, &[namespace(3)])
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn proofs_do_not_transfer_between_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _) = spawn_node(node_config(dir.path()));
    let mut rng = rng(3);
    let blobs = vec![
        random_blob(&mut rng, namespace(5), 2000),
        random_blob(&mut rng, namespace(5), 2000),
    ];
    Chain::new(vec![blobs.clone()]).import_into(&node).await;

    let proof = node
        .blobs
        .get_proof(1, blobs[0].namespace, &blobs[0].commitment)
        .await
        .unwrap();
    let other = node
        .blobs
        .get_proof(1, blobs[1].namespace, &blobs[1].commitment)
        .await
        .unwrap();
    assert_ne!(proof, other);
    assert!(matches!(
        node.blobs
            .included(1, blobs[1].namespace, &proof, &blobs[1].commitment)
            .await,
        Err(BlobError::InvalidProof)
    ));
}

#[tokio::test]
async fn unknown_height_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _) = spawn_node(node_config(dir.path()));
    let blob = random_blob(&mut rng(4), namespace(1), 10);
    assert!(matches!(
        node.blobs.get(7, blob.namespace, &blob.commitment).await,
        Err(BlobError::HeaderNotFound(7))
    ));
}

#[tokio::test]
async fn submit_pays_for_every_blob() {
    let dir = tempfile::tempdir().unwrap();
    let (node, submitter) = spawn_node(node_config(dir.path()));
    let mut rng = rng(5);
    let blobs: Vec<Blob> = (1..=3)
        .map(|i| random_blob(&mut rng, namespace(i), 100 * i as usize))
        .collect();

    assert_eq!(node.blobs.submit(&blobs).await.unwrap(), 1);
    assert_eq!(node.blobs.submit(&blobs[..1]).await.unwrap(), 2);
    assert!(matches!(
        node.blobs.submit(&[]).await,
        Err(BlobError::NoBlobs)
    ));

    let settings = node.blobs.settings();
    let gas = estimate_gas(settings, &blobs);
    let submitted = submitter.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0], (fee(settings, gas), gas, blobs.clone()));
}
