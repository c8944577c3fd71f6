use std::time::Duration;

use offrag_core::traits::DiagramRenderer;
use offrag_notes::{extract_flow, to_dot, DiagramStore, DotRenderer, DEFAULT_LABEL_CAP};

#[test]
fn dot_source_lists_nodes_and_edges() {
    let graph = extract_flow("Start here. Say \"hi\". Stop", DEFAULT_LABEL_CAP);
    let dot = to_dot(&graph);
    assert!(dot.starts_with("digraph Flowchart {"));
    assert!(dot.contains("0 [label=\"Start here\"];"));
    assert!(dot.contains("1 [label=\"Say \\\"hi\\\"\"];"));
    assert!(dot.contains("0 -> 1;"));
    assert!(dot.contains("1 -> 2;"));
    assert!(!dot.contains("2 -> 3;"));
}

#[test]
fn missing_dot_binary_is_an_error() {
    let renderer = DotRenderer::new("/nonexistent/graphviz/dot");
    assert!(renderer.render(&extract_flow("A. B.", DEFAULT_LABEL_CAP)).is_err());
}

#[test]
fn store_names_files_by_timestamp_and_prunes_oldest() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    std::fs::write(tmp.path().join("notes.txt"), b"unrelated")?;
    let store = DiagramStore::new(tmp.path(), 2);
    assert!(store.persists());

    let mut written = Vec::new();
    for i in 0..4u8 {
        written.push(store.save(&[i])?);
        std::thread::sleep(Duration::from_millis(2));
    }
    for path in &written {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("flowchart_") && name.ends_with(".png"), "{name}");
    }

    let kept = store.list()?;
    assert_eq!(kept, written[2..].to_vec());
    assert!(!written[0].exists());
    assert!(tmp.path().join("notes.txt").exists());
    assert_eq!(std::fs::read(&kept[1])?, vec![3u8]);
    Ok(())
}

#[test]
fn same_millisecond_saves_do_not_collide() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = DiagramStore::new(tmp.path(), 10);
    let a = store.save(b"a")?;
    let b = store.save(b"b")?;
    assert_ne!(a, b);
    assert_eq!(store.list()?.len(), 2);
    Ok(())
}

#[test]
fn zero_retention_keeps_diagrams_in_memory() {
    assert!(!DiagramStore::new(".", 0).persists());
}
