//! Exact nearest-neighbor search over chunk embeddings.
//!
//! - [`FlatL2Index`]: brute-force squared-L2 index, vectors addressed by offset
//! - [`IndexBuilder`]: batches chunk text through an embedder into an index
//! - [`Retriever`]: question in, concatenated top-k chunk context out

pub mod builder;
pub mod index;
pub mod retriever;

pub use builder::IndexBuilder;
pub use index::FlatL2Index;
pub use retriever::{Retrieval, RetrievedChunk, Retriever};
