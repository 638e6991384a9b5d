pub type PageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStatus {
    #[default]
    PendingExtraction,
    ProcessingIngestion,
    ProcessingExtraction,
    ExtractionDone,
    ExtractionError,
}

impl PageStatus {
    /// Pages that are still waiting on the server cannot be picked for batch work.
    pub fn is_selectable(self) -> bool {
        !matches!(
            self,
            PageStatus::ProcessingExtraction | PageStatus::ProcessingIngestion
        )
    }

    /// Statuses a page may be submitted for extraction from.
    pub fn is_submittable(self) -> bool {
        matches!(
            self,
            PageStatus::PendingExtraction | PageStatus::ExtractionError
        )
    }
}

pub(crate) const STATUS_READY: &str = "Ready for extraction";
pub(crate) const STATUS_UPLOADING: &str = "Uploading…";
pub(crate) const STATUS_SUBMITTING: &str = "Submitting…";
pub(crate) const STATUS_QUEUED: &str = "Queued, waiting for worker…";
pub(crate) const STATUS_DONE: &str = "Extraction complete";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub original_filename: String,
    /// Server-side file handle; `None` until ingestion completes.
    pub server_handle: Option<String>,
    pub ocr_text: String,
    /// Last server-confirmed text, used to detect manual edits.
    pub original_ocr_text: String,
    pub status: PageStatus,
    pub status_text: String,
    pub language_used: Option<String>,
}

impl Page {
    pub(crate) fn ingesting(id: PageId, original_filename: impl Into<String>) -> Self {
        Self {
            id,
            original_filename: original_filename.into(),
            server_handle: None,
            ocr_text: String::new(),
            original_ocr_text: String::new(),
            status: PageStatus::ProcessingIngestion,
            status_text: STATUS_UPLOADING.to_string(),
            language_used: None,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.ocr_text != self.original_ocr_text
    }
}

/// Ordered page collection; insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageStore {
    pages: Vec<Page>,
    next_id: PageId,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_ingesting(&mut self, original_filename: &str) -> PageId {
        self.next_id += 1;
        let id = self.next_id;
        self.pages.push(Page::ingesting(id, original_filename));
        id
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|page| page.id == id)
    }

    pub fn find_by_handle(&self, handle: &str) -> Option<&Page> {
        self.pages
            .iter()
            .find(|page| page.server_handle.as_deref() == Some(handle))
    }

    pub(crate) fn find_by_handle_mut(&mut self, handle: &str) -> Option<&mut Page> {
        self.pages
            .iter_mut()
            .find(|page| page.server_handle.as_deref() == Some(handle))
    }

    pub(crate) fn remove(&mut self, id: PageId) -> Option<Page> {
        let index = self.pages.iter().position(|page| page.id == id)?;
        Some(self.pages.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn any_processing_extraction(&self) -> bool {
        self.pages
            .iter()
            .any(|page| page.status == PageStatus::ProcessingExtraction)
    }

    pub fn selectable_ids(&self) -> Vec<PageId> {
        self.pages
            .iter()
            .filter(|page| page.status.is_selectable())
            .map(|page| page.id)
            .collect()
    }
}
