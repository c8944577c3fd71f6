pub mod chunker;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use chunker::{split_fixed, Chunker};
pub use error::{Error, ModelStage, Result};
