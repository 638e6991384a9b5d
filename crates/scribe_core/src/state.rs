use std::collections::{BTreeMap, BTreeSet};

use engine_logging::{engine_debug, engine_info};

use crate::view_model::{AppViewModel, AssemblyView, PageRowView};
use crate::{
    BatchId, Effect, PageId, PageStatus, PageStore, TaskRegistry, UploadId,
};

pub const DEFAULT_LANGUAGE: &str = "vie";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSettings {
    pub default_language: String,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Pre-submission state of one page, restored verbatim on rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageSnapshot {
    pub page_id: PageId,
    pub server_handle: String,
    pub status: PageStatus,
    pub status_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingBatch {
    pub language: String,
    pub snapshots: Vec<PageSnapshot>,
}

/// Page text ready to be written out once a session settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub original_filename: String,
    pub server_handle: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) language: String,
    pub(crate) pages: PageStore,
    pub(crate) registry: TaskRegistry,
    pub(crate) selection: BTreeSet<PageId>,
    pub(crate) viewed: Option<PageId>,
    pub(crate) viewed_text: String,
    pub(crate) text_edited: bool,
    pub(crate) polling: bool,
    pub(crate) next_batch_id: BatchId,
    pub(crate) pending_batches: BTreeMap<BatchId, PendingBatch>,
    pub(crate) next_upload_id: UploadId,
    pub(crate) pending_uploads: BTreeMap<UploadId, Vec<PageId>>,
    pub(crate) generating: bool,
    pub(crate) saving_document: Option<String>,
    notice: Option<Notice>,
    unread_notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            language: settings.default_language,
            ..Self::default()
        }
    }

    pub fn pages(&self) -> &PageStore {
        &self.pages
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn view(&self) -> AppViewModel {
        let pages = self
            .pages
            .iter()
            .map(|page| PageRowView {
                id: page.id,
                original_filename: page.original_filename.clone(),
                status: page.status,
                status_text: page.status_text.clone(),
                selectable: page.status.is_selectable(),
                selected: self.selection.contains(&page.id),
                modified: page.is_modified(),
                has_server_handle: page.server_handle.is_some(),
                language_used: page.language_used.clone(),
            })
            .collect();

        AppViewModel {
            pages,
            viewed_page: self.viewed,
            viewed_text: self.viewed_text.clone(),
            viewed_text_edited: self.text_edited,
            language: self.language.clone(),
            uploading: !self.pending_uploads.is_empty(),
            submitting_batches: self.pending_batches.len(),
            generating: self.generating,
            assembly: self.registry.assembly().map(|slot| AssemblyView {
                job_id: slot.job_id.clone(),
                status: slot.status,
                message: slot.message.clone(),
            }),
            outstanding_jobs: self.registry.len(),
            polling: self.polling,
            saving_document: self.saving_document.clone(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Text of every page that has any, in page order.
    pub fn transcripts(&self) -> Vec<Transcript> {
        self.pages
            .iter()
            .filter(|page| !page.ocr_text.trim().is_empty())
            .filter_map(|page| {
                Some(Transcript {
                    original_filename: page.original_filename.clone(),
                    server_handle: page.server_handle.clone()?,
                    text: page.ocr_text.clone(),
                })
            })
            .collect()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Notices raised since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.unread_notices)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let notice = Notice {
            level,
            text: text.into(),
        };
        engine_debug!("notice {:?}: {}", notice.level, notice.text);
        self.notice = Some(notice.clone());
        self.unread_notices.push(notice);
        self.dirty = true;
    }

    /// Starts the poll timer when work is outstanding and stops it once the
    /// registry drains. Both directions are idempotent.
    pub(crate) fn sync_polling(&mut self, effects: &mut Vec<Effect>) {
        match (self.registry.is_empty(), self.polling) {
            (false, false) => {
                engine_info!("Starting poll timer for {} job(s)", self.registry.len());
                self.polling = true;
                effects.push(Effect::StartPolling);
            }
            (true, true) => {
                engine_info!("No outstanding jobs; stopping poll timer");
                self.polling = false;
                effects.push(Effect::StopPolling);
            }
            _ => {}
        }
    }

    /// Refreshes the live text buffer if `page_id` is the viewed page.
    pub(crate) fn refresh_viewed(&mut self, page_id: PageId) {
        if self.viewed != Some(page_id) {
            return;
        }
        if let Some(page) = self.pages.get(page_id) {
            self.viewed_text = page.ocr_text.clone();
            self.text_edited = false;
        }
    }
}
