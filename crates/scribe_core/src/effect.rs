use crate::{AssemblyRequestPage, BatchId, ExtractionRequestPage, JobId, UploadEntry, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadFiles {
        upload_id: UploadId,
        files: Vec<UploadEntry>,
    },
    SubmitExtraction {
        batch_id: BatchId,
        pages: Vec<ExtractionRequestPage>,
        language: String,
    },
    SubmitAssembly {
        pages: Vec<AssemblyRequestPage>,
    },
    StartPolling,
    StopPolling,
    PollJob {
        job_id: JobId,
    },
    RetrieveDocument {
        filename: String,
    },
}
