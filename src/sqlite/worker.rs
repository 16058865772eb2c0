use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::Connection;
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc as tokio_mpsc, oneshot};

use crate::error::BatchError;
use crate::executor::{execute_batch, stream_batch};
use crate::results::{BatchResponse, OutboundMessage};
use crate::types::BatchRequest;

use super::config::BatchOptions;

/// Capacity of the channel carrying streamed messages back to the caller.
const STREAM_CHANNEL_CAPACITY: usize = 16;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(1);

/// Receiving side of a streamed batch.
pub type MessageReceiver = tokio_mpsc::Receiver<Result<OutboundMessage, BatchError>>;

/// Owned `SQLite` connection backed by a dedicated worker thread.
///
/// Batches submitted through clones of the same handle run one after another on the worker.
#[derive(Clone)]
pub struct BatchConnection {
    worker: Arc<BatchWorker>,
}

impl BatchConnection {
    /// Open a connection with `options` and move it onto a new worker thread.
    ///
    /// # Errors
    /// Returns [`BatchError`] if the database cannot be opened or the worker thread cannot be
    /// spawned.
    pub fn open(options: &BatchOptions) -> Result<Self, BatchError> {
        let conn = options.open()?;
        Self::from_connection(conn, options.rough_cutoff_size)
    }

    /// Move an already-open connection onto a new worker thread.
    ///
    /// # Errors
    /// Returns [`BatchError::ConnectionError`] if the worker thread cannot be spawned.
    pub fn from_connection(conn: Connection, rough_cutoff_size: usize) -> Result<Self, BatchError> {
        let worker = BatchWorker::spawn(conn, rough_cutoff_size)?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Execute a batch and return every entry result at once.
    ///
    /// # Errors
    /// Propagates any [`BatchError`] produced by the batch, or a
    /// [`BatchError::ConnectionError`] if the worker is gone.
    pub async fn execute_batch(&self, request: BatchRequest) -> Result<BatchResponse, BatchError> {
        self.worker.execute_batch(request).await
    }

    /// Classify a JSON request, execute it, and encode the response as JSON.
    ///
    /// # Errors
    /// Returns [`BatchError::MalformedRequest`] before anything runs if the request cannot be
    /// classified; otherwise as [`BatchConnection::execute_batch`].
    pub async fn execute_json(&self, request: &JsonValue) -> Result<JsonValue, BatchError> {
        let request = BatchRequest::from_json(request)?;
        self.execute_batch(request).await?.to_json()
    }

    /// Execute a batch in bounded mode, receiving messages as the worker produces them.
    ///
    /// The channel closes after the message with `more_follows == false`, or after an error.
    ///
    /// # Errors
    /// Returns [`BatchError::ConnectionError`] if the worker is gone.
    pub fn stream_batch(&self, request: BatchRequest) -> Result<MessageReceiver, BatchError> {
        self.worker.stream_batch(request)
    }

    /// Run synchronous `rusqlite` logic against the worker-owned connection.
    ///
    /// # Errors
    /// Propagates any [`BatchError`] raised by the callback or by worker communication.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, BatchError>
    where
        F: FnOnce(&mut Connection) -> Result<R, BatchError> + Send + 'static,
        R: Send + 'static,
    {
        self.worker.with_connection(func).await
    }

    #[must_use]
    pub fn rough_cutoff_size(&self) -> usize {
        self.worker.rough_cutoff_size
    }
}

impl fmt::Debug for BatchConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConnection")
            .field("worker_id", &self.worker.worker_id)
            .field("rough_cutoff_size", &self.worker.rough_cutoff_size)
            .finish()
    }
}

struct BatchWorker {
    sender: Sender<Command>,
    worker_id: usize,
    rough_cutoff_size: usize,
}

impl BatchWorker {
    fn spawn(conn: Connection, rough_cutoff_size: usize) -> Result<Self, BatchError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let worker_id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        thread::Builder::new()
            .name(format!("sqlite-batch-worker-{worker_id}"))
            .spawn(move || run_batch_worker(conn, &receiver, rough_cutoff_size))
            .map_err(|err| {
                BatchError::ConnectionError(format!("failed to spawn SQLite worker thread: {err}"))
            })?;
        tracing::info!(worker_id, "spawned SQLite batch worker");

        Ok(Self {
            sender,
            worker_id,
            rough_cutoff_size,
        })
    }

    fn send_command(&self, command: Command) -> Result<(), BatchError> {
        self.sender
            .send(command)
            .map_err(|_| BatchError::ConnectionError("SQLite worker closed".into()))
    }

    async fn execute_batch(&self, request: BatchRequest) -> Result<BatchResponse, BatchError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::ExecuteBatch {
            request,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            BatchError::ConnectionError("SQLite worker dropped while executing batch".into())
        })?
    }

    fn stream_batch(&self, request: BatchRequest) -> Result<MessageReceiver, BatchError> {
        let (tx, rx) = tokio_mpsc::channel(STREAM_CHANNEL_CAPACITY);
        self.send_command(Command::StreamBatch {
            request,
            respond_to: tx,
        })?;
        Ok(rx)
    }

    async fn with_connection<F, R>(&self, func: F) -> Result<R, BatchError>
    where
        F: FnOnce(&mut Connection) -> Result<R, BatchError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: BoxedCallback = Box::new(move |conn| {
            let _ = tx.send(func(conn));
        });
        self.send_command(Command::WithConnection { callback })?;
        rx.await.map_err(|_| {
            BatchError::ConnectionError(
                "SQLite worker dropped while handling custom callback".into(),
            )
        })?
    }
}

impl Drop for BatchWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

type BoxedCallback = Box<dyn FnOnce(&mut Connection) + Send>;

enum Command {
    ExecuteBatch {
        request: BatchRequest,
        respond_to: oneshot::Sender<Result<BatchResponse, BatchError>>,
    },
    StreamBatch {
        request: BatchRequest,
        respond_to: tokio_mpsc::Sender<Result<OutboundMessage, BatchError>>,
    },
    WithConnection {
        callback: BoxedCallback,
    },
    Shutdown,
}

fn run_batch_worker(mut conn: Connection, receiver: &Receiver<Command>, rough_cutoff_size: usize) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::ExecuteBatch {
                request,
                respond_to,
            } => {
                let outcome = execute_batch(&conn, &request);
                let _ = respond_to.send(outcome);
            }
            Command::StreamBatch {
                request,
                respond_to,
            } => {
                // a started batch always runs to completion, even without a listener
                let mut listening = true;
                for message in stream_batch(&conn, &request, rough_cutoff_size) {
                    if listening && respond_to.blocking_send(message).is_err() {
                        tracing::debug!("stream receiver dropped, discarding remaining messages");
                        listening = false;
                    }
                }
            }
            Command::WithConnection { callback } => callback(&mut conn),
            Command::Shutdown => break,
        }
    }
}
