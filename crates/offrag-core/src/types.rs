//! Domain types shared by the ingestion, retrieval and notes crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordinal of a document in corpus load order.
pub type DocId = usize;

/// Raw extracted text of one source file.
///
/// Held only until it is chunked; `id` is the position of the document in
/// the load order and is copied onto every chunk cut from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    pub fn new(id: DocId, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self { id, path: path.into(), text: text.into() }
    }
}

/// A fixed-size slice of a document and the retrieval unit of the index.
///
/// - `offset`: position in the global chunk sequence, shared with its vector
/// - `doc_id`/`doc_path`: provenance of the parent document
/// - `chunk_index`: position within the parent document
/// - `content`: the text payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub offset: usize,
    pub doc_id: DocId,
    pub doc_path: PathBuf,
    pub chunk_index: usize,
    pub content: String,
}

/// One nearest-neighbor result: the chunk offset and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub offset: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: usize,
    pub to: usize,
}

/// A single-path directed graph in narrative order.
///
/// Edges only ever link node `i` to node `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.label.as_str()).collect()
    }
}

/// Length bounds handed to a summarizer for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBounds {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self { min_length: 30, max_length: 100 }
    }
}
