//! Scribe engine: backend IO, the poll timer, and effect execution.
mod backend;
mod endpoints;
mod engine;
mod filename;
mod persist;
mod timer;
mod types;
pub mod wire;

pub use backend::{
    BackendSettings, JobBackend, ReqwestBackend, UploadSource, DEFAULT_MAX_DOCUMENT_BYTES,
};
pub use endpoints::document_url;
pub use engine::{EngineConfig, EngineHandle};
pub use filename::{transcript_filename, validate_document_filename};
pub use persist::{ensure_output_dir, Artifact, OutputWriter, PersistError};
pub use timer::DEFAULT_POLL_INTERVAL;
pub use types::{BackendError, BatchId, EngineError, EngineEvent, FailureKind, SaveError, UploadId};
