//! Exact nearest-neighbor search over document embeddings

use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use tracing::debug;
use tracing::warn;

use crate::errors::RagchatError;
use crate::errors::Result;
use crate::models::Document;
use crate::models::RetrievedDocument;

/// Cosine similarity of two vectors.
///
/// Returns 0.0 (never NaN) when either vector has zero magnitude, when the
/// lengths differ, or when the inputs contain non-finite values.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    similarity_with_norms(a, b, magnitude(a), magnitude(b))
}

/// Cosine distance, `1 - similarity`, in `[0, 2]`
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    to_distance(cosine_similarity(a, b))
}

fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

fn similarity_with_norms(a: &[f32], b: &[f32], norm_a: f64, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

fn to_distance(similarity: f32) -> f32 {
    (1.0 - similarity).clamp(0.0, 2.0)
}

#[derive(Debug, Clone)]
struct IndexEntry {
    document: Document,
    vector: Vec<f32>,
    norm: f64,
}

/// In-memory index of `(document, vector)` pairs.
///
/// Search is brute force and exact. Results are ordered by ascending cosine
/// distance; equal distances are ordered by ascending document id so that a
/// given index state always yields the same ranking.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    /// Document id -> position in `entries`
    positions: HashMap<i64, usize>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` entries
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Build an index from stored documents, skipping those without a usable embedding
    pub fn from_documents(
        dimension: usize,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let mut index = Self::new(dimension);
        for document in documents {
            let id = document.id;
            if let Err(e) = index.insert(document) {
                warn!(document_id = id, error = %e, "Skipping document while building index");
            }
        }
        debug!("Built vector index with {} entries", index.len());
        index
    }

    /// Insert a document, replacing any entry with the same id.
    ///
    /// The document's embedding is moved into the index; the stored document
    /// itself no longer carries it.
    pub fn insert(&mut self, mut document: Document) -> Result<()> {
        let vector = document.embedding.take().ok_or_else(|| {
            RagchatError::Validation(format!("document {} has no embedding", document.id))
        })?;
        if vector.len() != self.dimension {
            return Err(RagchatError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let id = document.id;
        let entry = IndexEntry {
            norm: magnitude(&vector),
            document,
            vector,
        };
        match self.positions.get(&id) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(id, self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// The `min(k, len)` documents closest to `vector`, most similar first
    pub fn query(&self, vector: &[f32], k: NonZeroUsize) -> Vec<RetrievedDocument> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        let query_norm = magnitude(vector);
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let similarity = if entry.vector.len() == vector.len() {
                    similarity_with_norms(vector, &entry.vector, query_norm, entry.norm)
                } else {
                    0.0
                };
                (to_distance(similarity), entry)
            })
            .collect();

        scored.sort_by(|(da, a), (db, b)| match da.total_cmp(db) {
            Ordering::Equal => a.document.id.cmp(&b.document.id),
            other => other,
        });

        scored
            .into_iter()
            .take(k.get())
            .map(|(distance, entry)| RetrievedDocument {
                document: entry.document.clone(),
                distance,
            })
            .collect()
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to the current index snapshot.
///
/// Readers clone an immutable `Arc<VectorIndex>` under a short read lock and
/// search it without holding any lock. Writers build a complete replacement
/// outside that lock and only take it to swap the `Arc`, so a query never
/// observes a partially applied update and never waits on a rebuild.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    current: Arc<RwLock<Arc<VectorIndex>>>,
    /// Serializes writers; readers never touch it
    writer: Arc<Mutex<()>>,
}

impl SharedIndex {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// The index as of now; later swaps do not affect the returned snapshot
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a freshly built index
    pub fn replace(&self, index: VectorIndex) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(index);
    }

    /// Copy-on-write update. Writers are serialized; on error nothing is published.
    ///
    /// The copy and `apply` run without the read/write lock held, so concurrent
    /// [`Self::snapshot`] calls keep returning the previous index meanwhile.
    pub fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut VectorIndex) -> Result<()>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = VectorIndex::clone(&self.snapshot());
        apply(&mut next)?;
        self.publish(next);
        Ok(())
    }

    fn publish(&self, index: VectorIndex) {
        let next = Arc::new(index);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const EPS: f32 = 1e-6;

    fn doc(id: i64, embedding: Vec<f32>) -> Document {
        let now = Utc::now();
        Document {
            id,
            content: format!("document {id}"),
            embedding: Some(embedding),
            created_at: now,
            updated_at: now,
        }
    }

    fn k(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = [0.3, -1.2, 4.5, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < EPS);
        assert!(cosine_distance(&v, &v).abs() < EPS);
    }

    #[test]
    fn test_zero_magnitude_is_zero_not_nan() {
        let zero = [0.0, 0.0, 0.0];
        let v = [1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert_eq!(cosine_distance(&zero, &v), 1.0);
    }

    #[test]
    fn test_opposite_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < EPS);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < EPS);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 5.0]).abs() < EPS);
    }

    #[test]
    fn test_mismatched_lengths_are_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_query_empty_index() {
        let index = VectorIndex::new(2);
        assert!(index.query(&[1.0, 0.0], k(5)).is_empty());
    }

    #[test]
    fn test_query_returns_min_k_n_sorted() {
        let index = VectorIndex::from_documents(
            2,
            vec![
                doc(1, vec![0.0, 1.0]),
                doc(2, vec![1.0, 0.1]),
                doc(3, vec![-1.0, 0.0]),
                doc(4, vec![1.0, 1.0]),
            ],
        );
        assert_eq!(index.len(), 4);

        let results = index.query(&[1.0, 0.0], k(3));
        assert_eq!(results.len(), 3);
        let ids: Vec<i64> = results.iter().map(|r| r.document.id).collect();
        assert_eq!(ids, vec![2, 4, 1]);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));

        let all = index.query(&[1.0, 0.0], k(10));
        assert_eq!(all.len(), 4);
        assert_eq!(all.last().unwrap().document.id, 3);
        assert!((all.last().unwrap().distance - 2.0).abs() < EPS);
    }

    #[test]
    fn test_ties_broken_by_ascending_id() {
        // inserted out of id order, all equidistant from the query
        let index = VectorIndex::from_documents(
            2,
            vec![
                doc(9, vec![0.0, 1.0]),
                doc(3, vec![0.0, 2.0]),
                doc(5, vec![0.0, 0.5]),
            ],
        );
        let ids: Vec<i64> = index
            .query(&[1.0, 0.0], k(3))
            .iter()
            .map(|r| r.document.id)
            .collect();
        assert_eq!(ids, vec![3, 5, 9]);
    }

    #[test]
    fn test_zero_query_vector_yields_distance_one() {
        let index = VectorIndex::from_documents(2, vec![doc(1, vec![1.0, 0.0])]);
        let results = index.query(&[0.0, 0.0], k(1));
        assert_eq!(results.len(), 1);
        assert!((results[0].distance - 1.0).abs() < EPS);
        assert!(!results[0].distance.is_nan());
    }

    fn ids(index: &VectorIndex) -> Vec<i64> {
        index
            .query(&[1.0, 0.0], k(index.len().max(1)))
            .iter()
            .map(|r| r.document.id)
            .collect()
    }

    #[test]
    fn test_documents_without_embeddings_are_excluded() {
        let mut missing = doc(2, vec![]);
        missing.embedding = None;
        let index = VectorIndex::from_documents(
            2,
            vec![doc(1, vec![1.0, 0.0]), missing, doc(3, vec![1.0])],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(ids(&index), vec![1]);
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut index = VectorIndex::new(3);
        let err = index.insert(doc(1, vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            RagchatError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_replaces_existing_id() {
        let mut index = VectorIndex::new(2);
        index.insert(doc(1, vec![1.0, 0.0])).unwrap();
        index.insert(doc(1, vec![0.0, 1.0])).unwrap();
        assert_eq!(index.len(), 1);

        let results = index.query(&[0.0, 1.0], k(1));
        assert!(results[0].distance < EPS);
    }

    #[test]
    fn test_large_build_with_repeated_ids_keeps_latest() {
        // 20k documents over 2k distinct ids; the last copy of each id wins
        let documents = (0..20_000_i64).map(|i| {
            let id = i % 2_000;
            let round = (i / 2_000) as f32;
            doc(id, vec![1.0, round])
        });
        let index = VectorIndex::from_documents(2, documents);
        assert_eq!(index.len(), 2_000);

        // every entry holds the round-9 vector [1, 9]
        let results = index.query(&[1.0, 9.0], k(2_000));
        assert_eq!(results.len(), 2_000);
        assert!(results.iter().all(|r| r.distance < EPS));
        assert_eq!(results[0].document.id, 0);
        assert_eq!(results[1_999].document.id, 1_999);
    }

    #[test]
    fn test_upsert_after_build_keeps_positions() {
        let mut index = VectorIndex::from_documents(
            2,
            vec![doc(1, vec![1.0, 0.0]), doc(2, vec![0.0, 1.0])],
        );
        index.insert(doc(3, vec![-1.0, 0.0])).unwrap();
        index.insert(doc(1, vec![0.0, -1.0])).unwrap();
        assert_eq!(index.len(), 3);

        let nearest = index.query(&[0.0, -1.0], k(1));
        assert_eq!(nearest[0].document.id, 1);
        assert!(nearest[0].distance < EPS);
    }

    #[test]
    fn test_shared_index_snapshot_isolated_from_swaps() {
        let shared = SharedIndex::new(VectorIndex::from_documents(
            2,
            vec![doc(1, vec![1.0, 0.0])],
        ));
        let before = shared.snapshot();

        shared
            .update(|index| index.insert(doc(2, vec![0.0, 1.0])))
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(shared.snapshot().len(), 2);
    }

    #[test]
    fn test_shared_index_failed_update_publishes_nothing() {
        let shared = SharedIndex::new(VectorIndex::new(2));
        let result = shared.update(|index| {
            index.insert(doc(1, vec![1.0, 0.0]))?;
            index.insert(doc(2, vec![1.0]))
        });
        assert!(result.is_err());
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_shared_index_readers_not_blocked_during_update() {
        let shared = SharedIndex::new(VectorIndex::from_documents(
            2,
            vec![doc(1, vec![1.0, 0.0])],
        ));
        let reader = shared.clone();

        shared
            .update(|index| {
                // the rebuild is in progress; readers still see the published index
                assert_eq!(reader.snapshot().len(), 1);
                index.insert(doc(2, vec![0.0, 1.0]))
            })
            .unwrap();

        assert_eq!(reader.snapshot().len(), 2);
    }

    #[test]
    fn test_shared_index_replace() {
        let shared = SharedIndex::new(VectorIndex::new(2));
        shared.replace(VectorIndex::from_documents(2, vec![doc(7, vec![1.0, 1.0])]));
        assert_eq!(ids(&shared.snapshot()), vec![7]);
    }
}
