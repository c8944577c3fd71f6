use std::sync::Arc;

use offrag_core::error::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::{validate_question, Answer, PipelineContext};

struct Job {
    question: String,
    cancel: CancellationToken,
    reply: oneshot::Sender<Result<Answer>>,
}

/// Single-flight request queue: one worker drains questions in submission order.
pub struct RequestQueue {
    tx: mpsc::Sender<Job>,
    worker: JoinHandle<()>,
}

impl RequestQueue {
    /// Start the worker on the current runtime. `capacity` bounds waiting requests.
    pub fn spawn(ctx: Arc<PipelineContext>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = if job.cancel.is_cancelled() {
                    Err(Error::Cancelled)
                } else {
                    ctx.answer(&job.question, &job.cancel).await
                };
                if job.reply.send(result).is_err() {
                    debug!("requester went away before the answer was ready");
                }
            }
        });
        Self { tx, worker }
    }

    /// Enqueue a question. Blank questions and a full queue fail immediately.
    pub fn submit(&self, question: &str) -> Result<Ticket> {
        let question = validate_question(question)?;
        let cancel = CancellationToken::new();
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(Job { question, cancel: cancel.clone(), reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::QueueFull,
                mpsc::error::TrySendError::Closed(_) => Error::QueueClosed,
            })?;
        Ok(Ticket { cancel, rx })
    }

    /// Stop accepting work and wait for queued requests to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "request worker ended abnormally");
        }
    }
}

/// Handle to one submitted request.
pub struct Ticket {
    cancel: CancellationToken,
    rx: oneshot::Receiver<Result<Answer>>,
}

impl Ticket {
    pub fn cancel(&self) { self.cancel.cancel(); }

    pub fn cancellation_token(&self) -> CancellationToken { self.cancel.clone() }

    pub async fn wait(self) -> Result<Answer> {
        self.rx.await.map_err(|_| Error::QueueClosed)?
    }
}
