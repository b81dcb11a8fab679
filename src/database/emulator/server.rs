use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::file_io::write_atomically;
use crate::tree;
use crate::ClientInitError;
use crate::DbPath;
use crate::OperationError;

lazy_static! {
    /// One shared tree per normalized database URL, or per state file for
    /// persistent servers.
    static ref SERVERS: DashMap<String, Arc<EmulatorServer>> = DashMap::new();
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareAndPut {
    /// Value stored at the path
    Committed(Value),
    /// Value found at the path instead of the expected one
    Conflict(Value),
}

/// Authoritative copy of one emulated database.
///
/// Writes are applied atomically under the root lock. Conditional writes
/// compare the whole subtree at the target path, which is what makes a
/// transaction on a parent conflict with any write beneath it.
///
/// A server opened with a state directory loads its tree from a JSON file
/// named after the URL and rewrites that file on every write, so separate
/// processes run one after another see the same data. The file is read
/// only when the server is opened.
#[derive(Debug, Default)]
pub struct EmulatorServer {
    url: String,

    root: RwLock<Value>,

    // Bumped on every applied write
    revision: AtomicU64,

    state_file: Option<PathBuf>,
}

impl EmulatorServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Server backed by `state_file`, starting from its content if present.
    pub fn load(
        url: impl Into<String>,
        state_file: PathBuf,
    ) -> Result<Self, ClientInitError> {
        let unreadable = |reason: String| ClientInitError::EmulatorState {
            path: state_file.clone(),
            reason,
        };
        let root = match std::fs::read(&state_file) {
            Ok(bytes) => {
                let value: Value = serde_json::from_slice(&bytes).map_err(|e| unreadable(e.to_string()))?;
                tree::normalize(value)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Value::Null,
            Err(e) => return Err(unreadable(e.to_string())),
        };

        Ok(Self {
            url: url.into(),
            root: RwLock::new(root),
            revision: AtomicU64::new(0),
            state_file: Some(state_file),
        })
    }

    /// Shared in-memory server for `url`, created on first use.
    pub fn connect(url: &str) -> Arc<EmulatorServer> {
        let key = normalize_url(url);
        SERVERS
            .entry(key.clone())
            .or_insert_with(|| {
                debug!("[Emulator] starting database for {}", key);
                Arc::new(EmulatorServer::new(key.clone()))
            })
            .clone()
    }

    /// Shared persistent server for `url` under `state_dir`, loaded on
    /// first use.
    pub fn open(
        url: &str,
        state_dir: &Path,
    ) -> Result<Arc<EmulatorServer>, ClientInitError> {
        let url = normalize_url(url);
        let state_file = state_dir.join(state_file_name(&url));
        let key = state_file.display().to_string();

        if let Some(server) = SERVERS.get(&key).map(|s| s.value().clone()) {
            return Ok(server);
        }

        let server = Arc::new(EmulatorServer::load(url.clone(), state_file.clone())?);
        info!("[Emulator] database for {} persisted at {}", url, state_file.display());
        Ok(SERVERS.entry(key).or_insert(server).clone())
    }

    /// Forget the shared in-memory server for `url`; connected clients keep
    /// their copy.
    pub fn dispose(url: &str) -> bool {
        SERVERS.remove(&normalize_url(url)).is_some()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Value at `path`, `Value::Null` when absent.
    pub fn get(
        &self,
        path: &DbPath,
    ) -> Value {
        tree::value_at(&self.root.read(), path)
    }

    /// Unconditional overwrite. Returns the new revision.
    pub fn put(
        &self,
        path: &DbPath,
        value: Value,
    ) -> Result<u64, OperationError> {
        let mut root = self.root.write();
        let revision = self.apply(&mut root, path, value)?;
        trace!("[Emulator-{}] put {} at revision {}", self.url, path, revision);
        Ok(revision)
    }

    /// Overwrite only if the subtree at `path` still equals `expected`.
    pub fn compare_and_put(
        &self,
        path: &DbPath,
        expected: &Value,
        value: Value,
    ) -> Result<CompareAndPut, OperationError> {
        let mut root = self.root.write();
        let current = tree::value_at(&root, path);
        if &current != expected {
            trace!("[Emulator-{}] conflict at {}", self.url, path);
            return Ok(CompareAndPut::Conflict(current));
        }
        let revision = self.apply(&mut root, path, value)?;
        trace!("[Emulator-{}] compare_and_put {} at revision {}", self.url, path, revision);
        Ok(CompareAndPut::Committed(tree::value_at(&root, path)))
    }

    /// Write through the state file first; the tree only changes once the
    /// file holds the new content.
    fn apply(
        &self,
        root: &mut Value,
        path: &DbPath,
        value: Value,
    ) -> Result<u64, OperationError> {
        match &self.state_file {
            Some(state_file) => {
                let mut next = root.clone();
                tree::set_at(&mut next, path, value);
                let persisted = serde_json::to_vec(&next)
                    .map_err(io::Error::from)
                    .and_then(|buf| write_atomically(state_file, &buf));
                if let Err(e) = persisted {
                    return Err(OperationError::Store(format!(
                        "failed to persist {}: {}",
                        state_file.display(),
                        e
                    )));
                }
                *root = next;
            }
            None => tree::set_at(root, path, value),
        }
        Ok(self.revision.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub(crate) fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// File name for a normalized URL: anything outside `[a-z0-9.-]` becomes `_`.
pub(crate) fn state_file_name(url: &str) -> String {
    let stem: String = url
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.json", stem)
}
