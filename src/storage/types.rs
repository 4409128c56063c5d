//! Types for storage operations

use serde::{Deserialize, Serialize};

/// Options for file uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// MIME type stored with the object
    pub content_type: String,

    /// Cache control header value, in seconds
    pub cache_control: String,

    /// Overwrite an existing object at the same path
    pub upsert: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            cache_control: "3600".to_string(),
            upsert: false,
        }
    }
}

impl FileOptions {
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Response of a successful upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedObject {
    /// `{bucket}/{path}` of the stored object
    #[serde(rename = "Key", alias = "key")]
    pub key: String,

    #[serde(rename = "Id", alias = "id", default)]
    pub id: Option<String>,
}

/// A stored object as listed or removed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileObject {
    pub name: String,

    #[serde(default)]
    pub bucket_id: Option<String>,

    #[serde(default)]
    pub id: Option<String>,
}

/// Body of a bulk remove
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RemoveRequest<'a> {
    pub prefixes: &'a [String],
}
