//! File models.
//!
//! A [`FileRecord`] is a stored text artifact scoped to exactly one source
//! and owner. `(owner_id, source_id, path)` is its natural key.
//!
//! [`FileUpload`] is the loose wire shape sent by the CLI; [`LocalFile`] is
//! the normalized local record the diff engine compares against stored rows.

use serde::{Deserialize, Serialize};

use crate::sync::content_hash;

/// Fallback content type when neither the caller nor the extension says.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// A stored file row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    pub source_id: String,

    /// Path relative to the source root, `/`-separated
    pub path: String,

    /// Display name (usually the last path segment)
    pub name: String,

    /// Text content; `None` for content the client could not send
    pub content: Option<String>,

    /// Size in bytes
    pub size: i64,

    pub mime_type: String,

    /// SHA256 fingerprint of `content`
    pub file_hash: String,

    pub created_at: i64,
    pub updated_at: i64,
}

/// A file as sent by the CLI to the local-sync endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileUpload {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_hash: Option<String>,
}

/// Normalized local file, ready for diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub path: String,
    pub name: String,
    pub content: Option<String>,
    pub size: i64,
    pub mime_type: String,
    pub file_hash: String,
}

impl LocalFile {
    /// Build a local file from text content, deriving every other field.
    #[must_use]
    pub fn from_content(path: &str, content: String) -> Self {
        let path = normalize_path(path);
        Self {
            name: file_name(&path),
            mime_type: guess_mime(&path),
            size: i64::try_from(content.len()).unwrap_or(i64::MAX),
            file_hash: content_hash(&content),
            content: Some(content),
            path,
        }
    }

    /// Normalize an upload.
    ///
    /// When content is present the fingerprint is recomputed here so that
    /// identical content hashes identically no matter which client sent it.
    #[must_use]
    pub fn from_upload(upload: FileUpload) -> Self {
        let path = normalize_path(&upload.path);
        let name = upload
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| file_name(&path));
        let mime_type = upload
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| guess_mime(&path));

        let (file_hash, size) = match &upload.content {
            Some(content) => (
                content_hash(content),
                i64::try_from(content.len()).unwrap_or(i64::MAX),
            ),
            None => (
                upload.file_hash.unwrap_or_else(|| content_hash("")),
                upload.size.unwrap_or(0),
            ),
        };

        Self {
            path,
            name,
            content: upload.content,
            size,
            mime_type,
            file_hash,
        }
    }
}

/// Changed fields of a stored file. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

impl FilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content.is_none()
            && self.size.is_none()
            && self.mime_type.is_none()
            && self.file_hash.is_none()
    }
}

/// Normalize a relative path: `/` separators, no leading `./` or `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn guess_mime(path: &str) -> String {
    mime_guess::from_path(path)
        .first()
        .map_or_else(|| DEFAULT_MIME_TYPE.to_string(), |m| m.essence_str().to_string())
}
