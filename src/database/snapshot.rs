use serde::de::DeserializeOwned;
use serde_json::Value;

use super::tree;
use super::DbPath;
use crate::OperationError;

/// Immutable point-in-time view of a subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    path: DbPath,
    value: Value,
}

impl DataSnapshot {
    pub fn new(
        path: DbPath,
        value: Value,
    ) -> Self {
        Self {
            path,
            value: tree::normalize(value),
        }
    }

    pub fn path(&self) -> &DbPath {
        &self.path
    }

    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    pub fn value(&self) -> Option<&Value> {
        if self.value.is_null() {
            None
        } else {
            Some(&self.value)
        }
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Snapshot of a descendant; absent descendants yield a snapshot whose
    /// `exists()` is false.
    pub fn child(
        &self,
        relative: &str,
    ) -> Result<DataSnapshot, OperationError> {
        let value = tree::value_at(&self.value, &DbPath::parse(relative)?);
        Ok(Self {
            path: self.path.child(relative)?,
            value,
        })
    }

    pub fn has_child(
        &self,
        relative: &str,
    ) -> bool {
        self.child(relative).map(|c| c.exists()).unwrap_or(false)
    }

    /// Direct children ordered by key.
    pub fn children(&self) -> Vec<DataSnapshot> {
        let Some(map) = self.value.as_object() else {
            return Vec::new();
        };
        map.iter()
            .filter_map(|(key, value)| {
                self.path.child(key).ok().map(|path| Self {
                    path,
                    value: value.clone(),
                })
            })
            .collect()
    }

    pub fn children_count(&self) -> usize {
        self.value.as_object().map(|m| m.len()).unwrap_or(0)
    }

    /// Decode the subtree; `None` if it does not exist.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.value().map(|v| serde_json::from_value(v.clone()))
    }
}
