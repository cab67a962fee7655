//! Serde model of the `pkg.json` document.

use serde::Deserialize;

/// Top-level manifest document.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDocument {
    /// Container names; the position in this list is the container index.
    pub kxrlist: Vec<ContainerRef>,
    /// Folder/file tree describing every packaged file.
    pub entries: Vec<Node>,
}

/// One element of `kxrlist`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRef {
    pub kxrname: String,
}

/// A node of the `entries` tree.
///
/// A node carrying a `list` key is a folder; anything else must be a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Folder {
        name: String,
        list: Vec<Node>,
    },
    File {
        name: String,
        kxr: u32,
        eid: u32,
    },
}

impl Node {
    /// The node's own path segment.
    pub fn name(&self) -> &str {
        match self {
            Node::Folder { name, .. } | Node::File { name, .. } => name,
        }
    }
}
