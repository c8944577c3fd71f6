use offrag_core::chunker::split_fixed;
use offrag_core::error::{Error, ModelStage, Result};
use offrag_core::traits::Summarizer;
use offrag_core::types::SummaryBounds;

pub const DEFAULT_WINDOW: usize = 500;

/// Stands in for a window that produced no summary text at all.
pub const TOO_SHORT_SENTINEL: &str = "(too short to summarize)";

/// Summarizes long text window by window.
#[derive(Debug, Clone)]
pub struct NotesGenerator {
    window: usize,
    bounds: SummaryBounds,
}

impl Default for NotesGenerator {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW, bounds: SummaryBounds::default() }
    }
}

impl NotesGenerator {
    pub fn new(window: usize, bounds: SummaryBounds) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidConfig("notes window must be greater than zero".into()));
        }
        if bounds.min_length > bounds.max_length {
            return Err(Error::InvalidConfig("summary min_length exceeds max_length".into()));
        }
        Ok(Self { window, bounds })
    }

    pub fn window(&self) -> usize { self.window }
    pub fn bounds(&self) -> SummaryBounds { self.bounds }

    /// Fixed `window`-character slices of `text`, same rule as corpus chunking.
    pub fn windows<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        split_fixed(text, self.window)
    }

    /// One summarizer call. Never yields an empty note.
    pub fn summarize_window(&self, summarizer: &dyn Summarizer, window: &str) -> Result<String> {
        let summary = summarizer
            .summarize(window, self.bounds)
            .map_err(|e| Error::model(ModelStage::Summarization, format!("{e:#}")))?;
        Ok(non_empty_note(summary, window))
    }

    /// Summarize every window in order and join the notes with `"\n"`.
    pub fn summarize_long(&self, text: &str, summarizer: &dyn Summarizer) -> Result<String> {
        let mut notes = Vec::new();
        for (i, window) in self.windows(text)?.into_iter().enumerate() {
            tracing::debug!(window = i, chars = window.chars().count(), "summarizing window");
            notes.push(self.summarize_window(summarizer, window)?);
        }
        Ok(join_notes(notes))
    }
}

pub fn join_notes<I, S>(notes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    notes.into_iter().map(|n| n.as_ref().to_string()).collect::<Vec<_>>().join("\n")
}

fn non_empty_note(summary: String, window: &str) -> String {
    if !summary.trim().is_empty() {
        return summary;
    }
    let fallback = window.trim();
    if fallback.is_empty() { TOO_SHORT_SENTINEL.to_string() } else { fallback.to_string() }
}
