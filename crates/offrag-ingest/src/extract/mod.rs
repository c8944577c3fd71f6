use std::path::Path;

mod docx;
mod pdf;
mod pptx;

pub use self::docx::extract_docx;
pub use self::pdf::extract_pdf;
pub use self::pptx::{extract_pptx, slide_rel_ids, slide_text};

/// Formats the loader knows how to read, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    /// `.doc` and `.docx` both go through the OOXML reader; legacy binary
    /// `.doc` files therefore fail as ingestion errors.
    Docx,
    Pptx,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    pub fn extract(self, path: &Path) -> anyhow::Result<String> {
        match self {
            Self::Pdf => extract_pdf(path),
            Self::Docx => extract_docx(path),
            Self::Pptx => extract_pptx(path),
        }
    }
}
