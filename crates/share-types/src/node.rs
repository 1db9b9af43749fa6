use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    // sockets, fifos, devices
    Other,
}

impl NodeKind {
    pub fn is_file_or_directory(&self) -> bool {
        matches!(self, Self::File | Self::Directory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub path: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: u64, path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(id),
            path: path.into(),
            kind,
        }
    }

    pub fn file(id: u64, path: impl Into<String>) -> Self {
        Self::new(id, path, NodeKind::File)
    }

    pub fn directory(id: u64, path: impl Into<String>) -> Self {
        Self::new(id, path, NodeKind::Directory)
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
