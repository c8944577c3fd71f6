use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context};
use offrag_core::error::{Error, Result};
use offrag_core::traits::DiagramRenderer;
use offrag_core::types::FlowGraph;

/// Graphviz source for a flow graph: digraph `Flowchart`, node ids `0..n`.
pub fn to_dot(graph: &FlowGraph) -> String {
    let mut dot = String::from("digraph Flowchart {\n");
    for node in &graph.nodes {
        let _ = writeln!(dot, "    {} [label=\"{}\"];", node.id, escape_label(&node.label));
    }
    for edge in &graph.edges {
        let _ = writeln!(dot, "    {} -> {};", edge.from, edge.to);
    }
    dot.push_str("}\n");
    dot
}

fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Renders through the Graphviz `dot` executable (`dot -Tpng`).
#[derive(Debug, Clone)]
pub struct DotRenderer {
    binary: PathBuf,
}

impl Default for DotRenderer {
    fn default() -> Self { Self::new("dot") }
}

impl DotRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self { Self { binary: binary.into() } }
}

impl DiagramRenderer for DotRenderer {
    fn render(&self, graph: &FlowGraph) -> anyhow::Result<Vec<u8>> {
        let source = to_dot(graph);
        let mut child = Command::new(&self.binary)
            .arg("-Tpng")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to launch {}", self.binary.display()))?;
        {
            let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("dot stdin unavailable"))?;
            stdin.write_all(source.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(anyhow!("dot exited with {}: {}", output.status, String::from_utf8_lossy(&output.stderr).trim()));
        }
        if output.stdout.is_empty() {
            return Err(anyhow!("dot produced no image"));
        }
        Ok(output.stdout)
    }
}

const FILE_PREFIX: &str = "flowchart_";
const FILE_SUFFIX: &str = ".png";

/// Writes rendered diagrams as `flowchart_<ms>.png` and keeps only the newest `keep_last`.
#[derive(Debug, Clone)]
pub struct DiagramStore {
    dir: PathBuf,
    keep_last: usize,
}

impl DiagramStore {
    pub fn new(dir: impl Into<PathBuf>, keep_last: usize) -> Self {
        Self { dir: dir.into(), keep_last }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// `false` when diagrams are meant to stay in memory.
    pub fn persists(&self) -> bool { self.keep_last > 0 }

    pub fn save(&self, png: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let mut stamp = chrono::Utc::now().timestamp_millis();
        let mut path = self.path_for(stamp);
        while path.exists() {
            stamp += 1;
            path = self.path_for(stamp);
        }
        std::fs::write(&path, png).map_err(|e| Error::Render(format!("writing {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "diagram written");
        self.prune()?;
        Ok(path)
    }

    /// Stored diagrams, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut found: Vec<(i64, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(stamp) = path.file_name().and_then(|n| n.to_str()).and_then(parse_stamp) {
                found.push((stamp, path));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }

    fn prune(&self) -> Result<()> {
        if self.keep_last == 0 { return Ok(()); }
        let files = self.list()?;
        let excess = files.len().saturating_sub(self.keep_last);
        for old in &files[..excess] {
            std::fs::remove_file(old)?;
            tracing::debug!(path = %old.display(), "old diagram removed");
        }
        Ok(())
    }

    fn path_for(&self, stamp: i64) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{stamp}{FILE_SUFFIX}"))
    }
}

fn parse_stamp(name: &str) -> Option<i64> {
    name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?.parse().ok()
}
