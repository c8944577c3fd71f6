//! Everything derived from retrieved context: notes, flow graph, diagram.

pub mod flow;
pub mod notes;
pub mod render;
pub mod summarize;

pub use flow::{extract_flow, truncate_label, DEFAULT_LABEL_CAP};
pub use notes::{NotesGenerator, DEFAULT_WINDOW, TOO_SHORT_SENTINEL};
pub use render::{to_dot, DiagramStore, DotRenderer};
pub use summarize::ExtractiveSummarizer;
