//! Resume files attached to applications

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Largest resume accepted by the upload form
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An opaque file to be stored next to an application
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile {
    /// Original file name, shown to the user
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: &str, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn pdf(name: &str, bytes: impl Into<Bytes>) -> Self {
        Self::new(name, PDF_CONTENT_TYPE, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercased text after the last `.`, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// The limits the upload form enforces: PDF only, at most 5 MiB
    pub fn check_upload_limits(&self) -> Result<()> {
        if self.content_type != PDF_CONTENT_TYPE {
            return Err(Error::validation(format!(
                "resume must be a PDF, got '{}'",
                self.content_type
            )));
        }
        if self.size() > MAX_RESUME_BYTES {
            return Err(Error::validation(format!(
                "resume is {} bytes, limit is {}",
                self.size(),
                MAX_RESUME_BYTES
            )));
        }
        Ok(())
    }

    /// Object path for this file under `prefix`.
    /// A random component keeps repeated uploads for one record apart.
    pub fn storage_path(&self, prefix: &str, application_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let file = match self.extension() {
            Some(ext) => format!("{}-{}.{}", application_id, token, ext),
            None => format!("{}-{}", application_id, token),
        };
        if prefix.is_empty() {
            file
        } else {
            format!("{}/{}", prefix, file)
        }
    }
}
