use crate::{
    BatchId, ExtractionScope, JobId, JobReport, LocalFile, PageId, SubmittedTask, UploadId,
    UploadedFile,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked files to add as pages.
    UploadRequested(Vec<LocalFile>),
    /// Server acknowledged (or rejected) an upload.
    UploadCompleted {
        upload_id: UploadId,
        result: Result<Vec<UploadedFile>, String>,
    },
    /// User ticked or unticked a page.
    PageSelectionToggled(PageId),
    /// User clicked "select all".
    SelectAllToggled,
    /// User opened a page in the viewer.
    PageViewed(PageId),
    /// User edited the text of the viewed page.
    ViewedTextEdited(String),
    /// User changed the default extraction language.
    LanguageChanged(String),
    /// User asked to run extraction again on a finished page.
    PageRequeued(PageId),
    /// User asked to extract text from pages.
    ExtractionRequested { scope: ExtractionScope },
    /// Backend answered an extraction batch submission.
    ExtractionSubmitted {
        batch_id: BatchId,
        result: Result<Vec<SubmittedTask>, String>,
    },
    /// User asked for the assembled document.
    AssemblyRequested,
    /// Backend answered the assembly submission.
    AssemblySubmitted { result: Result<JobId, String> },
    /// Poll timer fired.
    PollTick,
    /// A single status query came back.
    PollCompleted {
        job_id: JobId,
        result: Result<JobReport, String>,
    },
    /// The retrieved document was handed to the save action.
    DocumentSaved {
        filename: String,
        result: Result<String, String>,
    },
}
