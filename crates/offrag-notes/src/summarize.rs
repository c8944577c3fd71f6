use offrag_core::traits::Summarizer;
use offrag_core::types::SummaryBounds;

/// Offline lead-sentence summarizer.
///
/// Takes whole sentences from the start of the window until at least
/// `min_length` words are collected, then clips to `max_length` words.
/// Text with fewer words than `min_length` comes back whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> anyhow::Result<String> {
        let mut words: Vec<&str> = Vec::new();
        for sentence in sentences(text) {
            words.extend(sentence.split_whitespace());
            if words.len() >= bounds.min_length { break; }
        }
        let clipped = words.len() > bounds.max_length;
        words.truncate(bounds.max_length);
        let mut summary = words.join(" ");
        if clipped { summary.push_str("..."); }
        Ok(summary)
    }
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(|c: char| matches!(c, '.' | '!' | '?')).map(str::trim).filter(|s| !s.is_empty())
}
