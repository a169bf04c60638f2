//! Per-request in-memory similarity index over chunk embeddings.
//!
//! Built once, before any question is answered, then shared read-only by all
//! concurrent question tasks.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::{chunker::Chunk, embed::EmbeddingsProvider, error::PipelineError};

/// Chunk returned by a query with its cosine score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

#[derive(Debug)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Immutable chunk/vector table searched by brute-force cosine.
#[derive(Debug)]
pub struct SimilarityIndex {
    entries: Vec<Entry>,
    dim: usize,
}

impl SimilarityIndex {
    /// Embeds every chunk (at most `concurrency` calls in flight) and builds the index.
    ///
    /// # Errors
    /// The first embedding failure, or [`PipelineError::Embedding`] when the
    /// provider returns vectors of different lengths.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingsProvider,
        concurrency: usize,
    ) -> Result<Self, PipelineError> {
        info!(chunks = chunks.len(), concurrency, "building similarity index");

        let mut vectors: Vec<(usize, Vec<f32>)> = stream::iter(chunks.iter().enumerate())
            .map(|(i, c)| async move {
                let v = provider.embed(&c.text).await?;
                Ok::<_, PipelineError>((i, v))
            })
            .buffer_unordered(concurrency.max(1))
            .boxed()
            .try_collect()
            .await?;
        vectors.sort_unstable_by_key(|(i, _)| *i);

        let dim = vectors.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((i, v)) = vectors.iter().find(|(_, v)| v.len() != dim) {
            return Err(PipelineError::Embedding(format!(
                "inconsistent embedding size: chunk #{i} has {}, expected {dim}",
                v.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, (_, vector))| Entry { chunk, vector })
            .collect::<Vec<_>>();

        debug!(entries = entries.len(), dim, "similarity index ready");
        Ok(Self { entries, dim })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension, `0` for an empty index.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Up to `k` chunks by descending score; ties keep chunk order.
    ///
    /// `k` larger than the index returns every chunk.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: &e.chunk,
                score: cosine(query, &e.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(k);
        scored
    }

    /// Embeds `query` and returns its `k` best chunks.
    ///
    /// # Errors
    /// - embedding failures from `provider`
    /// - [`PipelineError::Embedding`] if the query vector has the wrong size
    /// - [`PipelineError::NoRelevantChunks`] if nothing can be returned
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<ScoredChunk<'_>>, PipelineError> {
        if self.is_empty() || k == 0 {
            return Err(PipelineError::NoRelevantChunks(query.to_string()));
        }

        let qv = provider.embed(query).await?;
        if qv.len() != self.dim {
            return Err(PipelineError::Embedding(format!(
                "query vector size {} does not match index size {}",
                qv.len(),
                self.dim
            )));
        }

        let hits = self.top_k(&qv, k);
        debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or_default(),
            "retrieved"
        );
        Ok(hits)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        future::Future,
        pin::Pin,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    /// Deterministic bag-of-letters embedder that counts its calls.
    #[derive(Default)]
    pub(crate) struct LetterEmbedder {
        pub(crate) calls: AtomicUsize,
    }

    impl EmbeddingsProvider for LetterEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, PipelineError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let mut v = vec![0.0f32; 26];
                for c in text.to_ascii_lowercase().bytes() {
                    if c.is_ascii_lowercase() {
                        v[(c - b'a') as usize] += 1.0;
                    }
                }
                Ok(v)
            })
        }
    }

    /// Counts overlapping calls and remembers the highest overlap seen.
    #[derive(Default)]
    pub(crate) struct InFlight {
        current: AtomicUsize,
        pub(crate) peak: AtomicUsize,
    }

    impl InFlight {
        pub(crate) async fn hold(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// [`LetterEmbedder`] that stays busy for a moment per call.
    #[derive(Default)]
    pub(crate) struct SlowEmbedder {
        pub(crate) in_flight: InFlight,
        inner: LetterEmbedder,
    }

    impl EmbeddingsProvider for SlowEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, PipelineError>> + Send + 'a>> {
            Box::pin(async move {
                self.in_flight.hold().await;
                self.inner.embed(text).await
            })
        }
    }

    pub(crate) fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            start: index * 10,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn builds_once_and_ranks_by_cosine() {
        let emb = LetterEmbedder::default();
        let chunks = vec![chunk(0, "zzz"), chunk(1, "abc"), chunk(2, "xyz")];
        let index = SimilarityIndex::build(chunks, &emb, 2).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dim(), 26);
        assert_eq!(emb.calls.load(Ordering::SeqCst), 3);

        let hits = index.retrieve("zz", 2, &emb).await.unwrap();
        assert_eq!(hits[0].chunk.text, "zzz");
        assert_eq!(hits[1].chunk.text, "xyz");
        assert_eq!(emb.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn build_keeps_embeddings_within_concurrency() {
        let emb = SlowEmbedder::default();
        let chunks = (0..10).map(|i| chunk(i, "some text")).collect();
        let index = SimilarityIndex::build(chunks, &emb, 4).await.unwrap();
        assert_eq!(index.len(), 10);
        assert_eq!(emb.in_flight.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn k_above_len_returns_everything_and_ties_keep_order() {
        let emb = LetterEmbedder::default();
        let chunks = vec![chunk(0, "aa"), chunk(1, "bb"), chunk(2, "a")];
        let index = SimilarityIndex::build(chunks, &emb, 8).await.unwrap();

        let hits = index.retrieve("a", 10, &emb).await.unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[tokio::test]
    async fn empty_index_has_no_relevant_chunks() {
        let emb = LetterEmbedder::default();
        let index = SimilarityIndex::build(vec![], &emb, 4).await.unwrap();
        let err = index.retrieve("anything", 3, &emb).await.unwrap_err();
        assert_eq!(err.code(), "NO_RELEVANT_CHUNKS");
        assert_eq!(emb.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
