// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn record(id: &str, embedding: Vec<f32>) -> MemoryRecord {
    MemoryRecord { id: id.to_string(), text: id.to_string(), embedding }
}

#[test]
fn identical_vectors_score_one() {
    let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn orthogonal_vectors_score_zero() {
    let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
    assert!(score.abs() < 1e-6);
}

#[test]
fn zero_and_mismatched_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn search_ranks_by_similarity() {
    let store = InMemoryMemoryStore::new();
    store.insert(record("close", vec![1.0, 0.1]));
    store.insert(record("far", vec![0.0, 1.0]));
    store.insert(record("exact", vec![1.0, 0.0]));

    let results = store.search(&[1.0, 0.0], 2);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, "exact");
    assert_eq!(results[1].0.id, "close");
}

#[test]
fn search_omits_zero_similarity() {
    let store = InMemoryMemoryStore::new();
    store.insert(record("orthogonal", vec![0.0, 1.0]));
    assert!(store.search(&[1.0, 0.0], 10).is_empty());
}

proptest! {
    // Commutative on any pair of same-length vectors.
    #[test]
    fn cosine_is_commutative(
        a in prop::collection::vec(-100.0f32..100.0, 1..8),
        b in prop::collection::vec(-100.0f32..100.0, 1..8),
    ) {
        let n = a.len().min(b.len());
        let (a, b) = (&a[..n], &b[..n]);
        let ab = cosine_similarity(a, b);
        let ba = cosine_similarity(b, a);
        prop_assert!((ab - ba).abs() < 1e-6);
    }

    // Scale-invariant on non-zero vectors under positive scaling.
    #[test]
    fn cosine_is_scale_invariant(
        a in prop::collection::vec(0.1f32..50.0, 2..8),
        b in prop::collection::vec(0.1f32..50.0, 2..8),
        scale in 0.5f32..20.0,
    ) {
        let n = a.len().min(b.len());
        let (a, b) = (&a[..n], &b[..n]);
        let scaled: Vec<f32> = a.iter().map(|x| x * scale).collect();
        let plain = cosine_similarity(a, b);
        let stretched = cosine_similarity(&scaled, b);
        prop_assert!((plain - stretched).abs() < 1e-4);
    }
}
