use std::fmt;
use std::path::PathBuf;

use crate::PageId;

/// Opaque job handle issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type BatchId = u64;
pub type UploadId = u64;

/// Which pages an extraction batch is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionScope {
    All,
    Selected,
}

/// A file chosen by the user, before it has a server handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub original_filename: String,
    pub path: PathBuf,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp",
];

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            original_filename,
            path,
        }
    }

    pub fn is_image(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }
}

/// Upload request entry: a local file bound to its placeholder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntry {
    pub page_id: PageId,
    pub file: LocalFile,
}

/// Upload acknowledgement for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_filename: String,
    pub server_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequestPage {
    pub server_handle: String,
    pub original_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRequestPage {
    pub server_handle: String,
    pub original_filename: String,
    pub language: String,
}

/// Per-page job handle returned by an accepted extraction batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTask {
    pub server_handle: String,
    pub job_id: JobId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

/// Status of a single polled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobReport {
    Pending,
    Finished {
        outcome: JobOutcome,
        result: JobResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Extraction,
    Assembly,
}

/// Terminal payload as reported. It is read as a page or a document result
/// according to the job the registry holds for the id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobResult {
    /// Declared kind, when the backend states one.
    pub kind: Option<JobKind>,
    pub server_handle: Option<String>,
    /// Worker-level verdict, separate from the job status.
    pub worker_succeeded: Option<bool>,
    pub text: Option<String>,
    pub language_used: Option<String>,
    pub document_filename: Option<String>,
    pub error: Option<String>,
}
