//! JSON shapes exchanged with the extraction backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub original_filename: String,
    pub temp_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionPage {
    pub temp_filename: String,
    pub original_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionBatchRequest {
    pub pages_to_ocr: Vec<ExtractionPage>,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractionBatchResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub submitted_tasks: Vec<SubmittedTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmittedTask {
    pub temp_filename: String,
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyPage {
    pub temp_filename: String,
    pub original_filename: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyRequest {
    pub files_to_process: Vec<AssemblyPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssemblyResponse {
    pub task_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Pending,
    Succeeded,
    Failed,
}

impl TaskStatusResponse {
    /// Collapses queue-specific states (`PENDING`, `STARTED`, `RETRY`, ...) to pending.
    pub fn state(&self) -> RemoteState {
        let status = self.status.trim();
        if status.eq_ignore_ascii_case("success") || status.eq_ignore_ascii_case("succeeded") {
            RemoteState::Succeeded
        } else if status.eq_ignore_ascii_case("failure") || status.eq_ignore_ascii_case("failed") {
            RemoteState::Failed
        } else {
            RemoteState::Pending
        }
    }
}

/// Terminal payload of either job kind.
///
/// The backend does not always say which kind of job produced a result, so
/// every field is optional and the caller reads it according to the job it
/// submitted. A `kind` tag is honoured when present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RemoteJobResult {
    pub kind: Option<String>,
    #[serde(alias = "handle")]
    pub temp_filename: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "ocr_text")]
    pub text: Option<String>,
    #[serde(alias = "lang", alias = "languageUsed")]
    pub lang_used: Option<String>,
    #[serde(alias = "documentFilename")]
    pub merged_pdf_filename: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Extraction,
    Assembly,
}

impl RemoteJobResult {
    /// Builds a result from a bare error value, as reported for crashed jobs.
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The declared kind, if the tag is present and recognised.
    pub fn kind(&self) -> Option<ResultKind> {
        let kind = self.kind.as_deref()?.trim();
        if kind.eq_ignore_ascii_case("extraction") {
            Some(ResultKind::Extraction)
        } else if kind.eq_ignore_ascii_case("assembly") {
            Some(ResultKind::Assembly)
        } else {
            None
        }
    }

    /// Worker-level verdict; `None` when the payload carries no status.
    pub fn worker_succeeded(&self) -> Option<bool> {
        self.status.as_deref().map(|status| {
            let status = status.trim();
            status.eq_ignore_ascii_case("success") || status.eq_ignore_ascii_case("succeeded")
        })
    }
}

/// Decoded status of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Finished {
        succeeded: bool,
        result: RemoteJobResult,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn detail_text(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
