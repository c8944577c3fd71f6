use std::sync::Arc;

use offrag_core::error::{Error, ModelStage, Result};
use offrag_core::traits::Embedder;
use offrag_core::types::Chunk;

use crate::index::FlatL2Index;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Context assembled for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// Retrieved chunk contents, nearest first, joined with `"\n"`.
    pub context: String,
    pub hits: Vec<RetrievedChunk>,
}

/// Owns the chunk store and its index; read-only once built.
pub struct Retriever {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// `chunks[i]` must correspond to vector `i` of `index`.
    pub fn new(chunks: Vec<Chunk>, index: FlatL2Index, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if chunks.len() != index.len() {
            return Err(Error::EmbeddingCountMismatch { expected: chunks.len(), actual: index.len() });
        }
        Ok(Self { chunks, index, embedder })
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn index(&self) -> &FlatL2Index { &self.index }
    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    pub fn query_vector(&self, question: &str) -> Result<Vec<f32>> {
        let mut out = self
            .embedder
            .embed_batch(&[question.to_string()])
            .map_err(|e| Error::model(ModelStage::Embedding, format!("{e:#}")))?;
        if out.len() != 1 {
            return Err(Error::EmbeddingCountMismatch { expected: 1, actual: out.len() });
        }
        Ok(out.remove(0))
    }

    /// Look up the `k` nearest chunks for an already embedded question.
    pub fn context_for(&self, query: &[f32], k: usize) -> Result<Retrieval> {
        if self.index.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let hits: Vec<RetrievedChunk> = self
            .index
            .search(query, k)?
            .into_iter()
            .filter_map(|h| self.chunks.get(h.offset).map(|c| RetrievedChunk { chunk: c.clone(), distance: h.distance }))
            .collect();
        let context = hits.iter().map(|h| h.chunk.content.as_str()).collect::<Vec<_>>().join("\n");
        tracing::debug!(k, returned = hits.len(), "retrieved context");
        Ok(Retrieval { context, hits })
    }

    pub fn retrieve(&self, question: &str, k: usize) -> Result<Retrieval> {
        if self.index.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let query = self.query_vector(question)?;
        self.context_for(&query, k)
    }
}
