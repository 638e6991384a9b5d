//! Scribe core: pure page/job state machine and view-model helpers.
//!
//! Every mutation goes through [`update`], which applies one [`Msg`] and
//! returns the [`Effect`]s the caller must execute. No IO happens here.
mod dispatch;
mod effect;
mod ingest;
mod job;
mod msg;
mod page;
mod registry;
mod state;
mod submit;
mod update;
mod view_model;

pub use dispatch::MAX_ERROR_EXCERPT;
pub use effect::Effect;
pub use job::{
    AssemblyRequestPage, BatchId, ExtractionRequestPage, ExtractionScope, JobId, JobKind,
    JobOutcome, JobReport, JobResult, LocalFile, SubmittedTask, UploadEntry, UploadId,
    UploadedFile,
};
pub use msg::Msg;
pub use page::{Page, PageId, PageStatus, PageStore};
pub use registry::{AssemblySlot, AssemblyStatus, ExtractionTicket, RetiredTask, TaskRegistry};
pub use state::{AppState, CoreSettings, Notice, NoticeLevel, Transcript, DEFAULT_LANGUAGE};
pub use update::update;
pub use view_model::{AppViewModel, AssemblyView, PageRowView};
