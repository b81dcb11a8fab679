//! Database
//!
//! The operation contract the scenarios consume from a hierarchical store:
//! - [`Database::set_value`] / [`Database::remove_value`] for plain writes
//! - [`Database::run_transaction`] for atomic read-modify-write on one path
//! - [`Database::read_once`] for a single snapshot of a subtree
//!
//! Every call delivers exactly one outcome. Any client honouring that can be
//! handed to [`crate::ScenarioRunner`]; [`emulator`] is the in-process one.

pub mod emulator;
mod path;
mod snapshot;
pub mod tree;

pub use emulator::EmulatorClient;
pub use emulator::EmulatorServer;
pub use path::*;
pub use snapshot::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::OperationError;

/// Mutator handed to [`Database::run_transaction`].
///
/// Receives the current value at the path (`None` when absent) and may be
/// invoked once per attempt while the store resolves conflicts.
pub type TransactionHandler = Box<dyn FnMut(Option<Value>) -> TransactionResult + Send + 'static>;

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionResult {
    /// Commit this value at the path
    Success(Value),
    /// Leave the path untouched
    Abort,
}

impl TransactionResult {
    pub fn success(value: impl Into<Value>) -> Self {
        TransactionResult::Success(value.into())
    }

    pub fn abort() -> Self {
        TransactionResult::Abort
    }
}

/// Outcome of a transaction that reached the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCompletion {
    pub committed: bool,
    /// Value at the path after the final attempt
    pub snapshot: DataSnapshot,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Overwrite the subtree at `path`. Writing `null` removes it.
    async fn set_value(
        &self,
        path: &DbPath,
        value: Value,
    ) -> Result<DbPath, OperationError>;

    async fn remove_value(
        &self,
        path: &DbPath,
    ) -> Result<DbPath, OperationError>;

    async fn run_transaction(
        &self,
        path: &DbPath,
        handler: TransactionHandler,
    ) -> Result<TransactionCompletion, OperationError>;

    async fn read_once(
        &self,
        path: &DbPath,
    ) -> Result<DataSnapshot, OperationError>;
}
