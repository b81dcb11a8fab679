use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;
use tracing::warn;

use crate::AssertionError;
use crate::OperationError;

/// One delivered completion.
#[derive(Debug)]
pub struct Completion<T> {
    pub label: &'static str,
    pub outcome: Result<T, OperationError>,
}

/// Wait-group style barrier over `expected` outstanding operations.
///
/// Each operation gets a [`CompletionSignal`] from [`signal`](Self::signal);
/// [`wait`](Self::wait) resolves once `expected` completions arrived and
/// yields them in arrival order.
pub struct CompletionLatch<T> {
    expected: usize,
    sender: Option<mpsc::UnboundedSender<Completion<T>>>,
    receiver: mpsc::UnboundedReceiver<Completion<T>>,
}

/// At-most-once completion handle. Dropping it unfired completes it with
/// [`OperationError::Dropped`].
pub struct CompletionSignal<T> {
    label: &'static str,
    sender: Option<mpsc::UnboundedSender<Completion<T>>>,
}

impl<T> CompletionLatch<T> {
    pub fn new(expected: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            expected,
            sender: Some(sender),
            receiver,
        }
    }

    pub fn signal(
        &self,
        label: &'static str,
    ) -> CompletionSignal<T> {
        CompletionSignal {
            label,
            sender: self.sender.clone(),
        }
    }

    /// Block until every expected completion arrived.
    ///
    /// Fails with [`AssertionError::JoinIncomplete`] if all signals are gone
    /// before `expected` completions were delivered.
    pub async fn wait(mut self) -> Result<Vec<Completion<T>>, AssertionError> {
        self.sender.take();
        let mut completions = Vec::with_capacity(self.expected);
        while completions.len() < self.expected {
            match self.receiver.recv().await {
                Some(completion) => {
                    trace!("latch received `{}`", completion.label);
                    completions.push(completion);
                }
                None => {
                    return Err(AssertionError::JoinIncomplete {
                        expected: self.expected,
                        received: completions.len(),
                    })
                }
            }
        }
        Ok(completions)
    }

    /// Like [`wait`](Self::wait), failing with
    /// [`AssertionError::JoinTimedOut`] once `timeout` elapsed.
    pub async fn wait_timeout(
        mut self,
        timeout: Duration,
    ) -> Result<Vec<Completion<T>>, AssertionError> {
        self.sender.take();
        let deadline = Instant::now() + timeout;
        let mut completions = Vec::with_capacity(self.expected);
        while completions.len() < self.expected {
            match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                Ok(Some(completion)) => completions.push(completion),
                Ok(None) => {
                    return Err(AssertionError::JoinIncomplete {
                        expected: self.expected,
                        received: completions.len(),
                    })
                }
                Err(_) => {
                    return Err(AssertionError::JoinTimedOut {
                        expected: self.expected,
                        received: completions.len(),
                        timeout,
                    })
                }
            }
        }
        Ok(completions)
    }
}

impl<T> CompletionSignal<T> {
    pub fn complete(
        mut self,
        outcome: Result<T, OperationError>,
    ) {
        self.send(outcome);
    }

    fn send(
        &mut self,
        outcome: Result<T, OperationError>,
    ) {
        if let Some(sender) = self.sender.take() {
            // The latch may already have given up waiting.
            let _ = sender.send(Completion {
                label: self.label,
                outcome,
            });
        }
    }
}

impl<T> Drop for CompletionSignal<T> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            warn!("completion `{}` dropped without firing", self.label);
            self.send(Err(OperationError::Dropped(self.label)));
        }
    }
}
