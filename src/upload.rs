//! Size and type checks for files attached to proposals and messages.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::validation::{RuleCollector, ValidationResult};

/// Default upload ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted by default.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
];

/// Filename suffixes refused regardless of declared MIME type.
pub const BLOCKED_EXTENSIONS: &[&str] = &[".exe", ".bat", ".cmd", ".scr", ".pif", ".com"];

/// Metadata of a file offered for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Client-supplied filename
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Declared MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl FileDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Upload rules: a size ceiling, a MIME allow-list and an extension deny-list.
///
/// The MIME and extension rules are independent and share the
/// `file-type-not-allowed` code. A file failing both gets the code twice.
///
/// # Examples
///
/// ```
/// use marketplace_policy::{ErrorCode, FileDescriptor, FileUploadPolicy};
///
/// let policy = FileUploadPolicy::default();
/// let big_pdf = FileDescriptor::new("brief.pdf", 15 * 1024 * 1024, "application/pdf");
///
/// assert_eq!(policy.validate(&big_pdf).errors(), &[ErrorCode::FileSizeTooLarge]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadPolicy {
    max_size_bytes: u64,
    allowed_mime_types: Vec<String>,
    blocked_extensions: Vec<String>,
}

impl FileUploadPolicy {
    /// Creates the default policy with a different size ceiling.
    pub fn with_max_size(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            ..Self::default()
        }
    }

    /// Replaces the MIME allow-list.
    pub fn allow_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the extension deny-list. Entries are matched case-insensitively.
    pub fn block_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    /// Returns the size ceiling in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Checks `file` against every rule.
    pub fn validate(&self, file: &FileDescriptor) -> ValidationResult {
        let mut rules = RuleCollector::new();
        rules
            .check(file.size <= self.max_size_bytes, ErrorCode::FileSizeTooLarge)
            .check(
                self.allowed_mime_types.iter().any(|m| *m == file.mime_type),
                ErrorCode::FileTypeNotAllowed,
            )
            .check(
                !self.has_blocked_extension(&file.name),
                ErrorCode::FileTypeNotAllowed,
            );
        let result = rules.finish();

        if !result.is_valid() {
            tracing::debug!(
                size = file.size,
                mime_type = %file.mime_type,
                errors = ?result.errors(),
                "upload rejected"
            );
        }
        result
    }

    fn has_blocked_extension(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.blocked_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
    }
}

impl Default for FileUploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_UPLOAD_BYTES,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            blocked_extensions: BLOCKED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Checks `file` against [`FileUploadPolicy::default`].
pub fn validate_upload(file: &FileDescriptor) -> ValidationResult {
    FileUploadPolicy::default().validate(file)
}
