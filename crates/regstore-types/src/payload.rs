use serde::{Deserialize, Serialize};

/// Fields stored for a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    /// Opaque content pointer (e.g. an IPFS CID).
    pub locator: String,
}

impl PostPayload {
    pub fn new(title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
        }
    }
}

/// Fields stored for a file.
///
/// `path` is kept alongside the record so the key can be re-derived and
/// listings can show where the content lives. `metadata` is opaque text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub path: String,
    pub locator: String,
    pub metadata: String,
}

impl FilePayload {
    pub fn new(
        path: impl Into<String>,
        locator: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            locator: locator.into(),
            metadata: metadata.into(),
        }
    }
}
