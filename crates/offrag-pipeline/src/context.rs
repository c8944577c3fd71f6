use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use offrag_core::config::Settings;
use offrag_core::error::{Error, ModelStage, Result};
use offrag_core::traits::{DiagramRenderer, Embedder, Summarizer};
use offrag_core::types::{Document, FlowGraph, SummaryBounds};
use offrag_core::Chunker;
use offrag_ingest::{CorpusLoader, IngestionFailure};
use offrag_notes::notes::join_notes;
use offrag_notes::{extract_flow, DiagramStore, NotesGenerator};
use offrag_vector::{IndexBuilder, RetrievedChunk, Retriever};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::guard::{CallPolicy, ModelGuard};

/// What startup ingestion saw; documents themselves are dropped after chunking.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub failures: Vec<IngestionFailure>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub png: Vec<u8>,
    /// Set when the diagram store retains files on disk.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub question: String,
    pub context: String,
    pub hits: Vec<RetrievedChunk>,
    pub notes: String,
    pub flow: FlowGraph,
    /// `None` when rendering is disabled or the flow graph is empty.
    pub diagram: Option<Diagram>,
}

/// Immutable per-process state shared by every request.
pub struct PipelineContext {
    retriever: Arc<Retriever>,
    summarizer: Arc<dyn Summarizer>,
    renderer: Option<Arc<dyn DiagramRenderer>>,
    store: DiagramStore,
    notes: NotesGenerator,
    top_k: usize,
    label_cap: usize,
    guard: ModelGuard,
}

impl PipelineContext {
    /// Load the corpus directory, chunk, embed and index it.
    ///
    /// Fails with `EmptyCorpus` when no chunk survives ingestion.
    pub fn build(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        summarizer: Arc<dyn Summarizer>,
        renderer: Option<Arc<dyn DiagramRenderer>>,
    ) -> Result<(Self, BuildReport)> {
        settings.validate()?;
        let ingest = CorpusLoader::new(&settings.corpus.dir).load()?;
        let mut report = BuildReport {
            documents: ingest.documents.len(),
            chunks: 0,
            failures: ingest.failures,
            skipped: ingest.skipped,
        };
        let files = report.documents + report.failures.len();
        let failures = report.failures.len();
        let ctx = Self::from_documents(settings, &ingest.documents, embedder, summarizer, renderer)
            .map_err(|e| match e {
                Error::EmptyCorpus { .. } => Error::EmptyCorpus { files, failures },
                other => other,
            })?;
        report.chunks = ctx.retriever.chunks().len();
        Ok((ctx, report))
    }

    /// Build from already extracted documents.
    pub fn from_documents(
        settings: &Settings,
        documents: &[Document],
        embedder: Arc<dyn Embedder>,
        summarizer: Arc<dyn Summarizer>,
        renderer: Option<Arc<dyn DiagramRenderer>>,
    ) -> Result<Self> {
        settings.validate()?;
        let chunks = Chunker::new(settings.chunking.chunk_size)?.chunk_documents(documents)?;
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus { files: documents.len(), failures: 0 });
        }
        let start = Instant::now();
        let index = IndexBuilder::new(Arc::clone(&embedder), settings.embedding.batch_size)
            .with_progress(chunks.len() > settings.embedding.batch_size)
            .build(&chunks)?;
        info!(chunks = chunks.len(), elapsed_ms = start.elapsed().as_millis() as u64, "pipeline ready");
        let retriever = Retriever::new(chunks, index, embedder)?;
        let bounds = SummaryBounds { min_length: settings.notes.min_length, max_length: settings.notes.max_length };
        Ok(Self {
            retriever: Arc::new(retriever),
            summarizer,
            renderer: if settings.render.enabled { renderer } else { None },
            store: DiagramStore::new(&settings.render.output_dir, settings.render.keep_last),
            notes: NotesGenerator::new(settings.notes.window, bounds)?,
            top_k: settings.retrieval.top_k,
            label_cap: settings.flow.label_cap,
            guard: ModelGuard::new(CallPolicy::from(&settings.runtime)),
        })
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.guard = ModelGuard::new(policy);
        self
    }

    pub fn retriever(&self) -> &Retriever { &self.retriever }
    pub fn top_k(&self) -> usize { self.top_k }

    /// Run one question end to end. Blank questions are rejected before any backend call.
    pub async fn answer(&self, question: &str, cancel: &CancellationToken) -> Result<Answer> {
        let question = validate_question(question)?;
        if self.retriever.index().is_empty() {
            return Err(Error::EmptyIndex);
        }
        let start = Instant::now();

        let retriever = Arc::clone(&self.retriever);
        let q = question.clone();
        let query = self.guard.call(ModelStage::Embedding, cancel, move || retriever.query_vector(&q)).await?;
        let retrieval = self.retriever.context_for(&query, self.top_k)?;

        let notes = self.notes_for(&retrieval.context, cancel).await?;
        let flow = extract_flow(&retrieval.context, self.label_cap);
        let diagram = self.diagram_for(&flow, cancel).await?;

        info!(hits = retrieval.hits.len(), nodes = flow.nodes.len(), elapsed_ms = start.elapsed().as_millis() as u64, "question answered");
        Ok(Answer { question, context: retrieval.context, hits: retrieval.hits, notes, flow, diagram })
    }

    async fn notes_for(&self, context: &str, cancel: &CancellationToken) -> Result<String> {
        let mut notes = Vec::new();
        for window in self.notes.windows(context)? {
            let generator = self.notes.clone();
            let summarizer = Arc::clone(&self.summarizer);
            let window = window.to_string();
            let note = self
                .guard
                .call(ModelStage::Summarization, cancel, move || generator.summarize_window(summarizer.as_ref(), &window))
                .await?;
            notes.push(note);
        }
        Ok(join_notes(notes))
    }

    async fn diagram_for(&self, flow: &FlowGraph, cancel: &CancellationToken) -> Result<Option<Diagram>> {
        let Some(renderer) = self.renderer.as_ref().map(Arc::clone) else { return Ok(None) };
        if flow.is_empty() {
            return Ok(None);
        }
        let graph = flow.clone();
        let png = self
            .guard
            .call(ModelStage::Rendering, cancel, move || {
                renderer.render(&graph).map_err(|e| Error::model(ModelStage::Rendering, format!("{e:#}")))
            })
            .await?;
        let path = if self.store.persists() { Some(self.store.save(&png)?) } else { None };
        Ok(Some(Diagram { png, path }))
    }
}

pub(crate) fn validate_question(question: &str) -> Result<String> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidQuestion);
    }
    Ok(trimmed.to_string())
}
