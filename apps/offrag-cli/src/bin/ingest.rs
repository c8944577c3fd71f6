use std::env;
use std::path::PathBuf;

use offrag_core::config::Config;
use offrag_core::Chunker;
use offrag_ingest::CorpusLoader;

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    offrag_core::logging::init(&settings.logging)?;
    let dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| settings.corpus.dir.clone());
    println!("Corpus ingestion report\n=======================");
    println!("Corpus directory: {}", dir.display());
    let report = CorpusLoader::new(&dir).load()?;
    let chunker = Chunker::new(settings.chunking.chunk_size)?;
    let chunks = chunker.chunk_documents(&report.documents)?;
    for doc in &report.documents {
        let count = chunks.iter().filter(|c| c.doc_id == doc.id).count();
        println!("  ✅ {}  {} chars, {} chunk(s)", doc.path.display(), doc.text.chars().count(), count);
    }
    for failure in &report.failures {
        println!("  ❌ {}  {}", failure.path.display(), failure.error);
    }
    for path in &report.skipped {
        println!("  ⏭️  {}  (unrecognized extension)", path.display());
    }
    println!("\n📊 {} document(s), {} failure(s), {} skipped, {} chunk(s) of {} chars",
        report.documents.len(), report.failures.len(), report.skipped.len(), chunks.len(), chunker.chunk_size());
    if chunks.is_empty() {
        println!("⚠️  Nothing to index: the corpus produced no chunks");
    }
    Ok(())
}
