use regstore_store::Record;
use regstore_types::{FileKey, FilePayload, PostId, PostPayload, Timestamp};
use serde::{Deserialize, Serialize};

/// A single post as returned by reads.
///
/// `timestamp` is the time of the last create or update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub locator: String,
    pub timestamp: Timestamp,
}

impl From<&Record<PostId, PostPayload>> for Post {
    fn from(record: &Record<PostId, PostPayload>) -> Self {
        Self {
            id: record.key,
            title: record.payload.title.clone(),
            locator: record.payload.locator.clone(),
            timestamp: record.updated_at,
        }
    }
}

/// A page of posts as parallel columns.
///
/// Entry `i` of each vector belongs to the same post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostColumns {
    pub titles: Vec<String>,
    pub timestamps: Vec<Timestamp>,
    pub locators: Vec<String>,
}

impl PostColumns {
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl<'a> FromIterator<&'a Record<PostId, PostPayload>> for PostColumns {
    fn from_iter<I: IntoIterator<Item = &'a Record<PostId, PostPayload>>>(iter: I) -> Self {
        let mut columns = Self::default();
        for record in iter {
            columns.titles.push(record.payload.title.clone());
            columns.timestamps.push(record.updated_at);
            columns.locators.push(record.payload.locator.clone());
        }
        columns
    }
}

/// A single file as returned by reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub key: FileKey,
    pub path: String,
    pub locator: String,
    pub metadata: String,
    pub timestamp: Timestamp,
}

impl From<&Record<FileKey, FilePayload>> for FileEntry {
    fn from(record: &Record<FileKey, FilePayload>) -> Self {
        Self {
            key: record.key,
            path: record.payload.path.clone(),
            locator: record.payload.locator.clone(),
            metadata: record.payload.metadata.clone(),
            timestamp: record.updated_at,
        }
    }
}

/// A set of files as parallel columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileColumns {
    pub paths: Vec<String>,
    pub locators: Vec<String>,
    pub timestamps: Vec<Timestamp>,
    pub metadata: Vec<String>,
}

impl FileColumns {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> FromIterator<&'a Record<FileKey, FilePayload>> for FileColumns {
    fn from_iter<I: IntoIterator<Item = &'a Record<FileKey, FilePayload>>>(iter: I) -> Self {
        let mut columns = Self::default();
        for record in iter {
            columns.paths.push(record.payload.path.clone());
            columns.locators.push(record.payload.locator.clone());
            columns.timestamps.push(record.updated_at);
            columns.metadata.push(record.payload.metadata.clone());
        }
        columns
    }
}
