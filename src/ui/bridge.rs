// WorkerBridge - Connects background jobs to the console front-end
//
// The front-end thread owns all presentation state and is the only reader of
// one bounded event channel. Stdin lines and worker completions both arrive on
// that channel, so completions are handled in order between commands and no
// worker ever touches front-end state directly.

use crate::services::{
    BatchReport, InstallReport, PreviewImage, RconError, RconOutcome, RemoveReport,
};
use camino::Utf8PathBuf;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Capacity of the event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Operation labels of the library batches; at most one runs at a time.
pub const LIBRARY_BATCHES: &[&str] = &["toggle", "install", "remove", "export"];

/// Events consumed by the front-end thread
#[derive(Debug)]
pub enum UiEvent {
    /// One line typed by the user
    Input(String),
    /// Stdin reached end of file
    InputClosed,
    /// A background job finished
    Completed(Completion),
}

/// Result of a background job
#[derive(Debug)]
pub enum Completion {
    Toggled(BatchReport),
    Installed(InstallReport),
    Removed(RemoveReport),
    Exported {
        path: Utf8PathBuf,
        records: usize,
        elapsed: Duration,
    },
    Preview {
        package: String,
        image: Option<PreviewImage>,
        saved_to: Option<Utf8PathBuf>,
    },
    Rcon {
        command: String,
        result: Result<RconOutcome, RconError>,
    },
    /// The job returned an error or panicked
    Failed { operation: String, message: String },
}

impl Completion {
    /// Whether this completion ends a library batch started with
    /// [`StateManager::begin_operation`](crate::state::StateManager::begin_operation).
    pub fn ends_library_batch(&self) -> bool {
        match self {
            Completion::Toggled(_)
            | Completion::Installed(_)
            | Completion::Removed(_)
            | Completion::Exported { .. } => true,
            Completion::Failed { operation, .. } => LIBRARY_BATCHES.contains(&operation.as_str()),
            Completion::Preview { .. } | Completion::Rcon { .. } => false,
        }
    }
}

/// Spawns jobs on the tokio runtime and posts their completions
#[derive(Clone)]
pub struct WorkerBridge {
    tokio_handle: tokio::runtime::Handle,
    event_tx: mpsc::Sender<UiEvent>,
}

impl WorkerBridge {
    /// Create the bridge and the receiving end of the event channel
    pub fn new(tokio_handle: tokio::runtime::Handle) -> (Self, mpsc::Receiver<UiEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                tokio_handle,
                event_tx,
            },
            event_rx,
        )
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }

    /// Sender for producers outside the runtime, e.g. the stdin reader thread
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.event_tx.clone()
    }

    /// Run blocking filesystem work on the blocking pool.
    ///
    /// A panic inside `job` becomes [`Completion::Failed`].
    pub fn spawn_blocking_job<F>(&self, operation: &str, job: F)
    where
        F: FnOnce() -> Completion + Send + 'static,
    {
        let operation = operation.to_string();
        let event_tx = self.event_tx.clone();

        self.tokio_handle.spawn(async move {
            let completion = match tokio::task::spawn_blocking(job).await {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::error!("Worker for '{}' failed: {}", operation, e);
                    Completion::Failed {
                        operation,
                        message: "The operation stopped unexpectedly; see the log for details."
                            .to_string(),
                    }
                }
            };

            post(&event_tx, completion).await;
        });
    }

    /// Run an async job on the runtime and post its completion
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        self.tokio_handle.spawn(async move {
            let completion = future_factory().await;
            post(&event_tx, completion).await;
        });
    }
}

async fn post(event_tx: &mpsc::Sender<UiEvent>, completion: Completion) {
    // Completions must not be dropped, so wait for room instead of try_send
    if event_tx.send(UiEvent::Completed(completion)).await.is_err() {
        tracing::warn!("Front-end has stopped; completion dropped");
    }
}
