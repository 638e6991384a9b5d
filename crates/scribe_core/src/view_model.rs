use crate::{AssemblyStatus, JobId, Notice, PageId, PageStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub pages: Vec<PageRowView>,
    pub viewed_page: Option<PageId>,
    pub viewed_text: String,
    pub viewed_text_edited: bool,
    pub language: String,
    pub uploading: bool,
    /// Extraction batches sent but not yet acknowledged.
    pub submitting_batches: usize,
    pub generating: bool,
    pub assembly: Option<AssemblyView>,
    pub outstanding_jobs: usize,
    pub polling: bool,
    pub saving_document: Option<String>,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRowView {
    pub id: PageId,
    pub original_filename: String,
    pub status: PageStatus,
    pub status_text: String,
    pub selectable: bool,
    pub selected: bool,
    pub modified: bool,
    pub has_server_handle: bool,
    pub language_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyView {
    pub job_id: JobId,
    pub status: AssemblyStatus,
    pub message: String,
}

impl AppViewModel {
    pub fn page(&self, id: PageId) -> Option<&PageRowView> {
        self.pages.iter().find(|row| row.id == id)
    }

    pub fn count_status(&self, status: PageStatus) -> usize {
        self.pages.iter().filter(|row| row.status == status).count()
    }

    pub fn all_selectable_selected(&self) -> bool {
        let mut selectable = self.pages.iter().filter(|row| row.selectable).peekable();
        selectable.peek().is_some() && selectable.all(|row| row.selected)
    }

    /// True when nothing is in flight: no upload, submission, outstanding
    /// job or pending document save.
    pub fn is_settled(&self) -> bool {
        !self.uploading
            && self.submitting_batches == 0
            && !self.generating
            && self.outstanding_jobs == 0
            && self.saving_document.is_none()
            && self.pages.iter().all(|row| row.selectable)
    }
}
