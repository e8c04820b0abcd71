use std::sync::Arc;

use tessera_core::getter::ShareGetter;
use tessera_eds::{
    Accessor, AccessorCacheSettings, Blockstore, EdsStore, EdsStoreSettings, StoreGetter,
};
use tokio::task::JoinSet;
use tests::{namespace, random_blob, rng, Chain};

fn store(dir: &std::path::Path, capacity: u64) -> Arc<EdsStore> {
    Arc::new(EdsStore::new(EdsStoreSettings {
        base_dir: dir.to_path_buf(),
        cache: AccessorCacheSettings {
            name: "e2e".to_string(),
            capacity,
        },
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_share_one_accessor() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), 4);
    let mut rng = rng(20);
    let chain = Chain::new(vec![vec![random_blob(&mut rng, namespace(1), 6000)]]);
    let (header, square) = &chain.blocks[0];
    store.put(&header.dah, square).await.unwrap();

    let getter = StoreGetter::new(Arc::clone(&store));
    let mut readers = JoinSet::new();
    for i in 0..32 {
        let getter = getter.clone();
        let root = header.dah.clone();
        readers.spawn(async move {
            let width = root.width();
            getter.get_share(&root, i % width, (i * 7) % width).await
        });
    }
    while let Some(read) = readers.join_next().await {
        read.unwrap().unwrap();
    }
    assert!(store.cache().contains(&header.dah.hash_hex()));
}

#[tokio::test(flavor = "multi_thread")]
async fn evicted_accessor_outlives_its_readers() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), 1);
    let mut rng = rng(21);
    let chain = Chain::new(vec![
        vec![random_blob(&mut rng, namespace(1), 700)],
        vec![random_blob(&mut rng, namespace(2), 700)],
    ]);
    for (header, square) in &chain.blocks {
        store.put(&header.dah, square).await.unwrap();
    }
    let (first, first_square) = &chain.blocks[0];
    let (second, _) = &chain.blocks[1];

    let held = store.accessor(&first.dah).await.unwrap();
    // loading the second square pushes the first out of a single slot cache
    let other = store.accessor(&second.dah).await.unwrap();
    // already gone if the eviction ran first
    let _ = store.cache().remove(&first.dah.hash_hex()).await;
    assert!(!store.cache().contains(&first.dah.hash_hex()));

    // the held handle keeps working until it is released
    assert_eq!(&*held.square().unwrap(), first_square);
    assert!(held.blockstore().unwrap().len() > 0);
    held.close().unwrap();
    drop(held);
    other.close().unwrap();

    // a fresh handle reopens the square from disk
    let reopened = store.accessor(&first.dah).await.unwrap();
    assert_eq!(&*reopened.square().unwrap(), first_square);
}
