//! Rebuilding blobs out of the per row shares of a namespace.

// crates
use tessera_core::blob::{shares_to_blobs, Blob};
use tessera_core::getter::NamespacedShares;
use tessera_core::share::{parse_sequence, sparse_shares_needed, Share};
use tessera_core::Commitment;
use tessera_nmt::NamespaceProof;
use tracing::debug;
// internal
use crate::proof::BlobProof;
use crate::BlobError;

/// Scans the rows of a namespace for the blob committed to by `commitment`.
///
/// Shares are accumulated row by row, leading padding is skipped and every complete blob is
/// compared against `commitment`. Scanning stops at the first row without shares. The returned
/// proof covers the rows the matching blob was read from.
pub fn find_by_commitment(
    namespaced: NamespacedShares,
    commitment: &Commitment,
) -> Result<(Blob, BlobProof), BlobError> {
    let mut accumulated: Vec<Share> = Vec::new();
    let mut proofs: Vec<NamespaceProof> = Vec::new();
    let mut mismatches = 0usize;

    for row in namespaced.0 {
        if row.shares.is_empty() {
            break;
        }
        accumulated.extend(row.shares);
        proofs.push(row.proof);

        loop {
            let Some(start) = accumulated.iter().position(|share| !share.is_padding()) else {
                // a row of padding only precedes whatever blob comes next
                accumulated.clear();
                proofs.clear();
                break;
            };
            accumulated.drain(..start);
            let needed = sparse_shares_needed(accumulated[0].sequence_len()?);
            if accumulated.len() < needed {
                break;
            }
            let candidate: Vec<Share> = accumulated.drain(..needed).collect();
            let blob = Blob::from_sequence(parse_sequence(&candidate)?)?;
            if &blob.commitment == commitment {
                debug!(mismatches, rows = proofs.len(), "Found blob by commitment");
                return Ok((blob, BlobProof(proofs)));
            }
            mismatches += 1;
            if accumulated.is_empty() {
                proofs.clear();
                break;
            }
            // the rest of the last row may hold the next blob
            proofs.drain(..proofs.len() - 1);
        }
    }

    debug!(mismatches, "Blob not found by commitment");
    Err(BlobError::NotFound)
}

/// Every blob of the namespace, in order.
pub fn all_blobs(namespaced: &NamespacedShares) -> Result<Vec<Blob>, BlobError> {
    Ok(shares_to_blobs(&namespaced.flatten())?)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use tessera_core::getter::{get_shares_by_namespace, RowNamespaceData};
    use tessera_core::testutils::{build_eds, namespace, random_blob};
    use tessera_core::Namespace;

    fn rows_of(shares: Vec<Share>, row_sizes: &[usize]) -> NamespacedShares {
        let mut shares = shares.into_iter();
        NamespacedShares(
            row_sizes
                .iter()
                .enumerate()
                .map(|(index, size)| RowNamespaceData {
                    shares: shares.by_ref().take(*size).collect(),
                    proof: NamespaceProof::inclusion(index, index + 1, vec![], true),
                })
                .collect(),
        )
    }

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn test_padding_is_skipped() {
        let mut rng = rng();
        let ns = namespace(1);
        let blob = random_blob(&mut rng, ns, 1200);
        let shares = blob.to_shares().unwrap();

        let plain = find_by_commitment(rows_of(shares.clone(), &[3]), &blob.commitment).unwrap();
        let mut padded = vec![Share::namespace_padding(ns); 2];
        padded.extend(shares);
        let skipped = find_by_commitment(rows_of(padded, &[5]), &blob.commitment).unwrap();
        assert_eq!(plain.0, skipped.0);
        assert_eq!(skipped.0.data, blob.data);
    }

    #[test]
    fn test_row_spanning_blob() {
        let mut rng = rng();
        let blob = random_blob(&mut rng, namespace(1), 2500);
        let shares = blob.to_shares().unwrap();
        assert_eq!(shares.len(), 5);
        let splits: [&[usize]; 5] = [&[5], &[1, 4], &[2, 3], &[4, 1], &[1, 1, 3]];
        for split in splits {
            let (found, proof) =
                find_by_commitment(rows_of(shares.clone(), split), &blob.commitment).unwrap();
            assert_eq!(found, blob);
            assert_eq!(proof.len(), split.len());
        }
    }

    #[test]
    fn test_second_blob_in_row() {
        let mut rng = rng();
        let ns = namespace(1);
        let first = random_blob(&mut rng, ns, 100);
        let second = random_blob(&mut rng, ns, 200);
        let mut shares = first.to_shares().unwrap();
        shares.extend(second.to_shares().unwrap());
        let (found, proof) =
            find_by_commitment(rows_of(shares, &[2]), &second.commitment).unwrap();
        assert_eq!(found, second);
        assert_eq!(proof.len(), 1);
    }

    #[test]
    fn test_proofs_trimmed_after_mismatch() {
        let mut rng = rng();
        let ns = namespace(1);
        let first = random_blob(&mut rng, ns, 1000);
        let second = random_blob(&mut rng, ns, 1000);
        let mut shares = first.to_shares().unwrap();
        shares.extend(second.to_shares().unwrap());
        // the first blob ends in row 1 where the second one starts
        let (found, proof) =
            find_by_commitment(rows_of(shares, &[1, 2, 1]), &second.commitment).unwrap();
        assert_eq!(found, second);
        assert_eq!(proof.rows()[0].start(), 1);
        assert_eq!(proof.len(), 2);
    }

    #[test]
    fn test_empty_row_stops_scan() {
        let mut rng = rng();
        let blob = random_blob(&mut rng, namespace(1), 100);
        let mut rows = rows_of(vec![], &[0]);
        rows.0.extend(rows_of(blob.to_shares().unwrap(), &[1]).0);
        assert!(matches!(
            find_by_commitment(rows, &blob.commitment),
            Err(BlobError::NotFound)
        ));
    }

    #[test]
    fn test_unknown_commitment() {
        let mut rng = rng();
        let blob = random_blob(&mut rng, namespace(1), 100);
        let other = random_blob(&mut rng, namespace(1), 100);
        assert!(matches!(
            find_by_commitment(rows_of(blob.to_shares().unwrap(), &[1]), &other.commitment),
            Err(BlobError::NotFound)
        ));
    }

    #[test]
    fn test_against_real_square() {
        let mut rng = rng();
        let ns: Namespace = namespace(7);
        let blobs = vec![
            random_blob(&mut rng, ns, 600),
            random_blob(&mut rng, ns, 3000),
            random_blob(&mut rng, namespace(8), 50),
        ];
        let (eds, root) = build_eds(blobs.clone());
        let shares = get_shares_by_namespace(&eds, &root, &ns).unwrap();
        for blob in &blobs[..2] {
            let (found, proof) = find_by_commitment(shares.clone(), &blob.commitment).unwrap();
            assert_eq!(&found, blob);
            assert!(!proof.is_empty());
        }
        assert_eq!(all_blobs(&shares).unwrap(), blobs[..2].to_vec());
    }
}
