use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use offrag_core::config::{Config, Settings};
use offrag_core::traits::{DiagramRenderer, Embedder, Summarizer};
use offrag_core::Error;
use offrag_embed::get_default_embedder;
use offrag_notes::{DotRenderer, ExtractiveSummarizer};
use offrag_pipeline::{Answer, PipelineContext, RequestQueue};
use tokio::runtime::Runtime;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ask \"<question>\" [corpus_dir] | interactive [corpus_dir]>", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn build_context(settings: &Settings) -> anyhow::Result<Arc<PipelineContext>> {
    println!("📂 Corpus: {}", settings.corpus.dir.display());
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let summarizer: Arc<dyn Summarizer> = Arc::new(ExtractiveSummarizer);
    let renderer: Arc<dyn DiagramRenderer> = Arc::new(DotRenderer::new(&settings.render.dot_binary));
    let (ctx, report) = PipelineContext::build(settings, embedder, summarizer, Some(renderer))?;
    for failure in &report.failures {
        println!("⚠️  Skipped {}: {}", failure.path.display(), failure.error);
    }
    println!("📊 Indexed {} chunks from {} document(s)", report.chunks, report.documents);
    Ok(Arc::new(ctx))
}

fn print_answer(answer: &Answer) {
    println!("\n🔍 Context for \"{}\":\n{}", answer.question, answer.context);
    for (i, hit) in answer.hits.iter().enumerate() {
        println!("  {}. distance={:.4}  {} #{}", i + 1, hit.distance, hit.chunk.doc_path.display(), hit.chunk.chunk_index);
    }
    println!("\n📝 Notes:\n{}", answer.notes);
    println!("\n🔀 Flow:");
    for node in &answer.flow.nodes {
        println!("  [{}] {}", node.id, node.label);
    }
    match &answer.diagram {
        Some(d) => match &d.path {
            Some(p) => println!("🖼️  Diagram: {}", p.display()),
            None => println!("🖼️  Diagram rendered ({} bytes, not saved)", d.png.len()),
        },
        None => println!("🖼️  No diagram"),
    }
}

async fn ask(queue: &RequestQueue, question: &str) -> Result<Answer, Error> {
    let ticket = queue.submit(question)?;
    let cancel = ticket.cancellation_token();
    tokio::select! {
        answer = ticket.wait() => answer,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            Err(Error::Cancelled)
        }
    }
}

fn run(cmd: &str, args: &[String], mut settings: Settings, rt: &Runtime) -> anyhow::Result<()> {
    match cmd {
        "ask" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: offrag ask \"<question>\" [corpus_dir]"); std::process::exit(1)
            });
            if let Some(dir) = args.get(1) { settings.corpus.dir = PathBuf::from(dir); }
            let ctx = build_context(&settings)?;
            let capacity = settings.runtime.queue_capacity;
            rt.block_on(async move {
                let queue = RequestQueue::spawn(ctx, capacity);
                let result = ask(&queue, &question).await;
                queue.shutdown().await;
                result
            }).map(|answer| print_answer(&answer))?;
        }
        "interactive" => {
            if let Some(dir) = args.first() { settings.corpus.dir = PathBuf::from(dir); }
            let ctx = build_context(&settings)?;
            let queue = rt.block_on(async { RequestQueue::spawn(ctx, settings.runtime.queue_capacity) });
            // Once ctrl_c() has been awaited the process keeps its handler, so Ctrl-C no longer exits.
            println!("💬 Ask a question (empty line to be reminded, Ctrl-C cancels an answer, Ctrl-D is the only way to quit)");
            let stdin = io::stdin();
            loop {
                print!("> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 { break; }
                match rt.block_on(ask(&queue, &line)) {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => println!("❌ {}", e),
                }
            }
            rt.block_on(queue.shutdown());
        }
        _ => { eprintln!("Unknown command: {}", cmd); std::process::exit(1); }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    offrag_core::logging::init(&settings.logging)?;
    let (cmd, args) = parse_args();
    let rt = Runtime::new()?;
    let outcome = run(&cmd, &args, settings, &rt);
    // A cancelled backend call may still be running on the blocking pool.
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}
