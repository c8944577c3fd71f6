//! Fixed-width, overlap-free chunking by character offset.

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Slice `text` at character offsets `0, size, 2 * size, ...`.
///
/// Yields `ceil(chars / size)` pieces borrowing from `text`; only the last may
/// be shorter than `size`. Empty text yields nothing.
pub fn split_fixed(text: &str, size: usize) -> Result<Vec<&str>> {
    if size == 0 {
        return Err(Error::InvalidConfig("chunk size must be greater than zero".into()));
    }
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (byte_idx, _) in text.char_indices() {
        if count == size {
            pieces.push(&text[start..byte_idx]);
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    Ok(pieces)
}

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be greater than zero".into()));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk every document independently and flatten into one sequence.
    ///
    /// Offsets are assigned in output order, so `chunks[i].offset == i`.
    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for doc in documents {
            for (chunk_index, piece) in split_fixed(&doc.text, self.chunk_size)?.into_iter().enumerate() {
                chunks.push(Chunk {
                    offset: chunks.len(),
                    doc_id: doc.id,
                    doc_path: doc.path.clone(),
                    chunk_index,
                    content: piece.to_string(),
                });
            }
        }
        tracing::debug!(documents = documents.len(), chunks = chunks.len(), size = self.chunk_size, "chunked corpus");
        Ok(chunks)
    }
}
