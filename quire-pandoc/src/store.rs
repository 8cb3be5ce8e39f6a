//! Node stores for the `link` rPNG strategy.
//!
//! Instead of hiding a node inside an image, the node is uploaded to a store
//! and the image is wrapped in a link to the URL the store hands back. On
//! decode, links the store recognises are fetched back into nodes.

use crate::error::RpngError;
use quire_schema::Node;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

pub trait NodeStore: Send + Sync {
    /// Stores a node and returns the URL it can be fetched from.
    fn put(&self, node: &Node) -> Result<String, RpngError>;

    /// Fetches a node previously stored under `url`.
    fn get(&self, url: &str) -> Result<Option<Node>, RpngError>;

    /// Whether `url` points into this store.
    fn owns(&self, url: &str) -> bool;
}

/// Stores nodes as JSON files in a local directory, addressed by `file://` URL.
///
/// File names are derived from a checksum of the node's JSON, so storing the
/// same node twice yields the same URL.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RpngError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        Ok(DirectoryStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, url: &str) -> Option<PathBuf> {
        let path = Url::parse(url).ok()?.to_file_path().ok()?;
        (path.parent() == Some(self.root.as_path())).then_some(path)
    }
}

impl NodeStore for DirectoryStore {
    fn put(&self, node: &Node) -> Result<String, RpngError> {
        let json = serde_json::to_string(node)?;
        let mut crc = flate2::Crc::new();
        crc.update(json.as_bytes());
        let path = self
            .root
            .join(format!("{:08x}-{}.json", crc.sum(), json.len()));
        fs::write(&path, json)?;
        let url = Url::from_file_path(&path)
            .map_err(|_| RpngError::Store(format!("not an absolute path: {}", path.display())))?;
        Ok(url.to_string())
    }

    fn get(&self, url: &str) -> Result<Option<Node>, RpngError> {
        let Some(path) = self.path_of(url) else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn owns(&self, url: &str) -> bool {
        self.path_of(url).is_some()
    }
}
