use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use offrag_core::error::{Error, Result};
use offrag_core::types::Document;
use tracing::{info, warn};

use crate::extract::DocumentFormat;

/// A recognized file that could not be turned into a document.
#[derive(Debug)]
pub struct IngestionFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<Document>,
    pub failures: Vec<IngestionFailure>,
    /// Files with an extension no extractor handles.
    pub skipped: Vec<PathBuf>,
}

impl IngestReport {
    /// Recognized files, parsed or not.
    pub fn files_seen(&self) -> usize {
        self.documents.len() + self.failures.len()
    }
}

/// Reads every file directly inside one directory (no recursion).
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extract all recognized files in directory listing order.
    ///
    /// Only an unreadable corpus directory is an error. A file whose extractor
    /// fails (or panics) is recorded in `failures` and the batch continues.
    pub fn load(&self) -> Result<IngestReport> {
        if !self.dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("corpus directory not found: {}", self.dir.display()),
            )));
        }
        let mut report = IngestReport::default();
        for entry in walkdir::WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let Some(format) = DocumentFormat::from_path(&path) else {
                report.skipped.push(path);
                continue;
            };
            match extract_isolated(format, &path) {
                Ok(text) => {
                    let id = report.documents.len();
                    report.documents.push(Document::new(id, path, text));
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "document skipped");
                    report.failures.push(IngestionFailure { path, error });
                }
            }
        }
        info!(
            dir = %self.dir.display(),
            documents = report.documents.len(),
            failures = report.failures.len(),
            skipped = report.skipped.len(),
            "corpus loaded"
        );
        Ok(report)
    }
}

fn extract_isolated(format: DocumentFormat, path: &Path) -> Result<String> {
    let outcome = catch_unwind(AssertUnwindSafe(|| format.extract(path)));
    let reason = match outcome {
        Ok(Ok(text)) => return Ok(text),
        Ok(Err(e)) => format!("{e:#}"),
        Err(_) => "extractor panicked".to_string(),
    };
    Err(Error::Ingestion { path: path.to_path_buf(), reason })
}
