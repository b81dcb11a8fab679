use std::fmt;
use std::str::FromStr;

use crate::OperationError;

const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Location of a node in the tree.
///
/// Parsing ignores leading, trailing and repeated `/`, so `"/test//users/"`
/// and `"test/users"` name the same node. The root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, OperationError> {
        let mut segments = Vec::new();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            validate_key(raw, segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Descend by a relative path, which may itself contain `/`.
    pub fn child(
        &self,
        relative: &str,
    ) -> Result<Self, OperationError> {
        let relative = Self::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(relative.segments);
        Ok(Self { segments })
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment; `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `other` equals this path or lies beneath it.
    pub fn contains(
        &self,
        other: &DbPath,
    ) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

fn validate_key(
    raw: &str,
    key: &str,
) -> Result<(), OperationError> {
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
    {
        return Err(OperationError::InvalidPath {
            path: raw.to_string(),
            reason: format!("key `{}` contains forbidden character {:?}", key, c),
        });
    }
    Ok(())
}

impl fmt::Display for DbPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl FromStr for DbPath {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
