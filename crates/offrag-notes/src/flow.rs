use offrag_core::types::{FlowEdge, FlowGraph, FlowNode};

pub const DEFAULT_LABEL_CAP: usize = 50;

/// Split `text` on `.` into trimmed, non-empty units and chain them in order.
///
/// Node `i` is labeled with unit `i` (see [`truncate_label`]); edges link
/// `i -> i + 1` only. Text without any unit yields an empty graph.
pub fn extract_flow(text: &str, label_cap: usize) -> FlowGraph {
    let mut graph = FlowGraph::default();
    for unit in text.split('.').map(str::trim).filter(|u| !u.is_empty()) {
        let id = graph.nodes.len();
        graph.nodes.push(FlowNode { id, label: truncate_label(unit, label_cap) });
        if id > 0 {
            graph.edges.push(FlowEdge { from: id - 1, to: id });
        }
    }
    tracing::debug!(nodes = graph.nodes.len(), "extracted flow");
    graph
}

/// Keep the first `cap` characters, appending `...` when anything was cut.
pub fn truncate_label(unit: &str, cap: usize) -> String {
    match unit.char_indices().nth(cap) {
        Some((byte_idx, _)) => format!("{}...", &unit[..byte_idx]),
        None => unit.to_string(),
    }
}
