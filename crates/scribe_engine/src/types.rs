use std::path::PathBuf;

use thiserror::Error;

use crate::persist::PersistError;
use crate::wire::{JobStatus, SubmittedTask, UploadedFile};

pub type BatchId = u64;
pub type UploadId = u64;

#[derive(Debug)]
pub enum EngineEvent {
    UploadFinished {
        upload_id: UploadId,
        result: Result<Vec<UploadedFile>, BackendError>,
    },
    ExtractionSubmitted {
        batch_id: BatchId,
        result: Result<Vec<SubmittedTask>, BackendError>,
    },
    AssemblySubmitted {
        result: Result<String, BackendError>,
    },
    /// The repeating poll timer fired.
    PollTick,
    JobPolled {
        job_id: String,
        result: Result<JobStatus, BackendError>,
    },
    DocumentSaved {
        filename: String,
        result: Result<PathBuf, SaveError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("invalid url")]
    InvalidUrl,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error")]
    Network,
    #[error("unexpected response")]
    Decode,
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("invalid filename")]
    InvalidFilename,
    #[error("local file unreadable")]
    LocalFile,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine worker: {0}")]
    Worker(#[from] std::io::Error),
    #[error("failed to build backend client: {0}")]
    Backend(#[from] BackendError),
}
