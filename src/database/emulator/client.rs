use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::CompareAndPut;
use super::EmulatorServer;
use crate::ClientConfig;
use crate::DataSnapshot;
use crate::Database;
use crate::DbPath;
use crate::OperationError;
use crate::TransactionCompletion;
use crate::TransactionHandler;
use crate::TransactionResult;

type Reply<T> = oneshot::Sender<Result<T, OperationError>>;

enum Request {
    Set {
        path: DbPath,
        value: Value,
        reply: Reply<DbPath>,
    },
    Transaction {
        path: DbPath,
        handler: TransactionHandler,
        reply: Reply<TransactionCompletion>,
    },
    Read {
        path: DbPath,
        reply: Reply<DataSnapshot>,
    },
}

/// [`Database`] backed by an [`EmulatorServer`].
///
/// Calls are queued to a worker task that handles each request in its own
/// task after a sampled round-trip latency, so operations issued without
/// awaiting each other may complete in any order. Completions are
/// delivered from the worker's tasks, never from the caller's.
pub struct EmulatorClient {
    client_id: String,
    server: Arc<EmulatorServer>,
    requests: mpsc::UnboundedSender<Request>,
    shutdown: CancellationToken,
}

impl EmulatorClient {
    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn start(
        server: Arc<EmulatorServer>,
        config: ClientConfig,
    ) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let client_id = config.id.clone();

        let worker = Worker {
            server: server.clone(),
            config,
            shutdown: shutdown.clone(),
        };
        tokio::spawn(worker.run(rx));

        debug!("[Client-{}] connected to {}", client_id, server.url());
        Self {
            client_id,
            server,
            requests,
            shutdown,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn server(&self) -> &Arc<EmulatorServer> {
        &self.server
    }

    pub fn is_connected(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stop the worker. Outstanding and later calls fail with
    /// [`OperationError::Disconnected`].
    pub fn shutdown(&self) {
        if self.is_connected() {
            debug!("[Client-{}] shutting down", self.client_id);
        }
        self.shutdown.cancel();
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Request,
    ) -> Result<T, OperationError> {
        if !self.is_connected() {
            return Err(OperationError::Disconnected);
        }
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(build(tx))
            .map_err(|_| OperationError::Disconnected)?;
        rx.await.map_err(|_| OperationError::Disconnected)?
    }
}

#[async_trait]
impl Database for EmulatorClient {
    async fn set_value(
        &self,
        path: &DbPath,
        value: Value,
    ) -> Result<DbPath, OperationError> {
        debug!("[Client-{}] set {}", self.client_id, path);
        self.request(|reply| Request::Set {
            path: path.clone(),
            value,
            reply,
        })
        .await
    }

    async fn remove_value(
        &self,
        path: &DbPath,
    ) -> Result<DbPath, OperationError> {
        debug!("[Client-{}] remove {}", self.client_id, path);
        self.request(|reply| Request::Set {
            path: path.clone(),
            value: Value::Null,
            reply,
        })
        .await
    }

    async fn run_transaction(
        &self,
        path: &DbPath,
        handler: TransactionHandler,
    ) -> Result<TransactionCompletion, OperationError> {
        debug!("[Client-{}] transaction {}", self.client_id, path);
        self.request(|reply| Request::Transaction {
            path: path.clone(),
            handler,
            reply,
        })
        .await
    }

    async fn read_once(
        &self,
        path: &DbPath,
    ) -> Result<DataSnapshot, OperationError> {
        debug!("[Client-{}] read {}", self.client_id, path);
        self.request(|reply| Request::Read {
            path: path.clone(),
            reply,
        })
        .await
    }
}

struct Worker {
    server: Arc<EmulatorServer>,
    config: ClientConfig,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(
        self,
        mut requests: mpsc::UnboundedReceiver<Request>,
    ) {
        let worker = Arc::new(self);
        loop {
            tokio::select! {
                _ = worker.shutdown.cancelled() => {
                    debug!("[Client-{}] worker stopped", worker.config.id);
                    break;
                }
                request = requests.recv() => match request {
                    Some(request) => {
                        let worker = worker.clone();
                        tokio::spawn(async move { worker.dispatch(request).await });
                    }
                    None => break,
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: Request,
    ) {
        // A caller that stopped waiting is not an error for the worker.
        match request {
            Request::Set { path, value, reply } => {
                let _ = reply.send(self.guarded(self.set(path, value)).await);
            }
            Request::Transaction {
                path,
                handler,
                reply,
            } => {
                let _ = reply.send(self.guarded(self.transaction(path, handler)).await);
            }
            Request::Read { path, reply } => {
                let _ = reply.send(self.guarded(self.read(path)).await);
            }
        }
    }

    async fn guarded<T>(
        &self,
        operation: impl Future<Output = Result<T, OperationError>>,
    ) -> Result<T, OperationError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(OperationError::Disconnected),
            outcome = operation => outcome,
        }
    }

    async fn round_trip(&self) {
        let latency = self.config.sample_latency();
        if !latency.is_zero() {
            sleep(latency).await;
        }
    }

    async fn set(
        &self,
        path: DbPath,
        value: Value,
    ) -> Result<DbPath, OperationError> {
        self.round_trip().await;
        self.server.put(&path, value)?;
        Ok(path)
    }

    async fn read(
        &self,
        path: DbPath,
    ) -> Result<DataSnapshot, OperationError> {
        self.round_trip().await;
        let value = self.server.get(&path);
        Ok(DataSnapshot::new(path, value))
    }

    /// Optimistic read-modify-write: run the handler on the last value seen,
    /// commit only if the server still holds that value, otherwise retry
    /// against what the server returned.
    async fn transaction(
        &self,
        path: DbPath,
        mut handler: TransactionHandler,
    ) -> Result<TransactionCompletion, OperationError> {
        self.round_trip().await;
        let mut current = self.server.get(&path);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let input = if current.is_null() {
                None
            } else {
                Some(current.clone())
            };

            let next = match handler(input) {
                TransactionResult::Success(next) => next,
                TransactionResult::Abort => {
                    debug!("[Client-{}] transaction {} aborted by handler", self.config.id, path);
                    return Ok(TransactionCompletion {
                        committed: false,
                        snapshot: DataSnapshot::new(path, current),
                    });
                }
            };

            self.round_trip().await;
            match self.server.compare_and_put(&path, &current, next)? {
                CompareAndPut::Committed(stored) => {
                    debug!(
                        "[Client-{}] transaction {} committed after {} attempt(s)",
                        self.config.id, path, attempts
                    );
                    return Ok(TransactionCompletion {
                        committed: true,
                        snapshot: DataSnapshot::new(path, stored),
                    });
                }
                CompareAndPut::Conflict(found) => {
                    if attempts >= self.config.max_transaction_retries {
                        warn!(
                            "[Client-{}] transaction {} gave up after {} attempts",
                            self.config.id, path, attempts
                        );
                        return Err(OperationError::MaxRetries {
                            path: path.to_string(),
                            attempts,
                        });
                    }
                    warn!(
                        "[Client-{}] transaction {} conflicted (attempt {}), retrying",
                        self.config.id, path, attempts
                    );
                    current = found;
                }
            }
        }
    }
}
