//! Uploaded proof files and their content-addressed storage keys.

use super::{TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

const DIGEST_PREFIX_BYTES: usize = 6;

/// A proof file supplied by the submitter.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactUpload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl ArtifactUpload {
    /// Creates an upload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] when the file name is blank.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, TaskDomainError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(TaskDomainError::EmptyField { field: "file name" });
        }
        Ok(Self {
            file_name,
            content_type: None,
            bytes,
        })
    }

    /// Sets the MIME type reported by the client.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the MIME type, if known.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ArtifactUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Object path under which an upload is stored.
///
/// Shaped `{user}/{task}_{millis}_{digest}_{name}`, where `digest` is a
/// short SHA-256 prefix of the contents and `name` is the file name with
/// path separators and whitespace replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Derives the key for `upload`.
    #[must_use]
    pub fn derive(
        user_id: UserId,
        task_id: TaskId,
        uploaded_at: DateTime<Utc>,
        upload: &ArtifactUpload,
    ) -> Self {
        let digest = Sha256::digest(upload.bytes());
        let prefix: String = digest
            .iter()
            .take(DIGEST_PREFIX_BYTES)
            .map(|byte| format!("{byte:02x}"))
            .collect();
        let name = sanitise(upload.file_name());
        Self(format!(
            "{user_id}/{task_id}_{millis}_{prefix}_{name}",
            millis = uploaded_at.timestamp_millis()
        ))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitise(file_name: &str) -> String {
    file_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
