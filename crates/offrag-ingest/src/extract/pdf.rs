use anyhow::{anyhow, Result};
use lopdf::Document as PdfDoc;
use std::path::Path;

/// Concatenate the text of every page, each followed by a newline.
///
/// A page whose text cannot be extracted contributes nothing; only a file
/// that cannot be opened as a PDF at all is an error.
pub fn extract_pdf(path: &Path) -> Result<String> {
    let doc = PdfDoc::load(path).map_err(|e| anyhow!("not a readable PDF: {}", e))?;
    let mut text = String::new();
    for page_num in doc.get_pages().into_keys() {
        let page_text = match doc.extract_text(&[page_num]) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(path = %path.display(), page = page_num, error = %e, "skipping unreadable page");
                String::new()
            }
        };
        // lopdf closes every text object with its own newline.
        let page_text = page_text.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if !page_text.is_empty() {
            text.push_str(page_text);
            text.push('\n');
        }
    }
    Ok(text)
}
