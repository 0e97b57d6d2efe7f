use serde::{Deserialize, Serialize};

// Catalog entry for a stored file; content lives in the node's file store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub version: u64,
}

impl FileRecord {
    // A freshly created file starts at version 0
    pub fn new(filename: impl Into<String>) -> Self {
        FileRecord {
            filename: filename.into(),
            version: 0,
        }
    }

    // The record after one more overwrite of the same key
    pub fn next_version(&self, filename: impl Into<String>) -> Self {
        FileRecord {
            filename: filename.into(),
            version: self.version + 1,
        }
    }
}
