use offrag_core::traits::Summarizer;
use offrag_core::types::{FlowEdge, SummaryBounds};
use offrag_notes::{extract_flow, truncate_label, ExtractiveSummarizer, NotesGenerator, DEFAULT_LABEL_CAP, TOO_SHORT_SENTINEL};

fn first_twenty(text: &str) -> String {
    text.chars().take(20).collect()
}

#[test]
fn long_text_yields_one_note_per_window() {
    let text: String = (0..1100).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let notes = NotesGenerator::default().summarize_long(&text, &first_twenty).unwrap();
    let segments: Vec<&str> = notes.split('\n').collect();
    assert_eq!(segments.len(), 3);
    assert!(segments.iter().all(|s| s.chars().count() == 20));
    assert_eq!(segments[0], first_twenty(&text));
}

#[test]
fn short_trailing_window_is_still_summarized() {
    let generator = NotesGenerator::new(10, SummaryBounds::default()).unwrap();
    let notes = generator.summarize_long("0123456789ab", &ExtractiveSummarizer).unwrap();
    assert_eq!(notes, "0123456789\nab");
}

#[test]
fn empty_summary_falls_back_to_window_then_sentinel() {
    let silent = |_: &str| String::new();
    let generator = NotesGenerator::default();
    assert_eq!(generator.summarize_window(&silent, "  tiny ").unwrap(), "tiny");
    assert_eq!(generator.summarize_window(&silent, "   ").unwrap(), TOO_SHORT_SENTINEL);
}

#[test]
fn empty_text_has_no_notes() {
    assert_eq!(NotesGenerator::default().summarize_long("", &first_twenty).unwrap(), "");
}

#[test]
fn invalid_generator_settings_are_rejected() {
    assert!(NotesGenerator::new(0, SummaryBounds::default()).is_err());
    assert!(NotesGenerator::new(500, SummaryBounds { min_length: 10, max_length: 5 }).is_err());
}

#[test]
fn extractive_summary_respects_word_bounds() {
    let bounds = SummaryBounds { min_length: 4, max_length: 6 };
    let text = "Plants need light. They also need water. Soil matters too.";
    assert_eq!(ExtractiveSummarizer.summarize(text, bounds).unwrap(), "Plants need light. They also need...");
    let short = "Too short.";
    assert_eq!(ExtractiveSummarizer.summarize(short, bounds).unwrap(), "Too short.");
}

#[test]
fn flow_from_three_sentences() {
    let graph = extract_flow("A. B. C.", DEFAULT_LABEL_CAP);
    assert_eq!(graph.labels(), vec!["A", "B", "C"]);
    assert_eq!(graph.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(graph.edges, vec![FlowEdge { from: 0, to: 1 }, FlowEdge { from: 1, to: 2 }]);
}

#[test]
fn flow_boundaries() {
    assert!(extract_flow(" . .. ", DEFAULT_LABEL_CAP).is_empty());
    assert!(extract_flow("", DEFAULT_LABEL_CAP).edges.is_empty());

    let single = extract_flow("  only one unit  ", DEFAULT_LABEL_CAP);
    assert_eq!(single.labels(), vec!["only one unit"]);
    assert!(single.edges.is_empty());
}

#[test]
fn long_units_are_truncated_with_ellipsis() {
    let unit = "x".repeat(60);
    let graph = extract_flow(&format!("{unit}. short"), DEFAULT_LABEL_CAP);
    assert_eq!(graph.nodes[0].label, format!("{}...", "x".repeat(50)));
    assert_eq!(graph.nodes[1].label, "short");

    assert_eq!(truncate_label(&"y".repeat(50), 50), "y".repeat(50));
    assert_eq!(truncate_label("héllo wörld", 5), "héllo...");
}
