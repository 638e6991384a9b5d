//! Page intake and the user-driven page operations (selection, viewing, editing).

use engine_logging::{engine_info, engine_warn};

use crate::page::STATUS_READY;
use crate::{
    AppState, Effect, LocalFile, NoticeLevel, PageId, PageStatus, UploadEntry, UploadId,
    UploadedFile,
};

pub(crate) fn request_upload(state: &mut AppState, files: Vec<LocalFile>) -> Vec<Effect> {
    let images: Vec<LocalFile> = files.into_iter().filter(LocalFile::is_image).collect();
    if images.is_empty() {
        state.notify(NoticeLevel::Info, "No valid image files to upload.");
        return Vec::new();
    }

    state.next_upload_id += 1;
    let upload_id = state.next_upload_id;
    let entries: Vec<UploadEntry> = images
        .into_iter()
        .map(|file| UploadEntry {
            page_id: state.pages.push_ingesting(&file.original_filename),
            file,
        })
        .collect();
    state
        .pending_uploads
        .insert(upload_id, entries.iter().map(|entry| entry.page_id).collect());
    state.mark_dirty();

    engine_info!("Upload {} started with {} file(s)", upload_id, entries.len());
    vec![Effect::UploadFiles {
        upload_id,
        files: entries,
    }]
}

pub(crate) fn complete_upload(
    state: &mut AppState,
    upload_id: UploadId,
    result: Result<Vec<UploadedFile>, String>,
) {
    let Some(page_ids) = state.pending_uploads.remove(&upload_id) else {
        engine_warn!("Ignoring completion for unknown upload {}", upload_id);
        return;
    };
    state.mark_dirty();

    let mut uploaded = match result {
        Ok(uploaded) => uploaded,
        Err(err) => {
            engine_warn!("Upload {} failed: {}", upload_id, err);
            for page_id in page_ids {
                discard_placeholder(state, page_id);
            }
            state.notify(NoticeLevel::Error, format!("Upload failed: {err}"));
            return;
        }
    };

    let mut accepted = 0usize;
    for page_id in page_ids {
        let matched = state.pages.get(page_id).and_then(|page| {
            uploaded
                .iter()
                .position(|file| file.original_filename == page.original_filename)
        });
        let Some(index) = matched else {
            discard_placeholder(state, page_id);
            continue;
        };
        let file = uploaded.remove(index);
        if let Some(page) = state.pages.get_mut(page_id) {
            page.server_handle = Some(file.server_handle);
            page.status = PageStatus::PendingExtraction;
            page.status_text = STATUS_READY.to_string();
            accepted += 1;
        }
    }

    if state.viewed.is_none() {
        if let Some(first) = state.pages.selectable_ids().first().copied() {
            view_page(state, first);
        }
    }

    engine_info!("Upload {} completed: {} page(s) ingested", upload_id, accepted);
    state.notify(NoticeLevel::Success, format!("{accepted} page(s) uploaded."));
}

fn discard_placeholder(state: &mut AppState, page_id: PageId) {
    if let Some(page) = state.pages.remove(page_id) {
        engine_warn!("Dropping page {:?}: not accepted by the server", page.original_filename);
    }
    state.selection.remove(&page_id);
}

pub(crate) fn toggle_selection(state: &mut AppState, page_id: PageId) {
    let selectable = state
        .pages
        .get(page_id)
        .is_some_and(|page| page.status.is_selectable());
    if !selectable {
        return;
    }
    if !state.selection.remove(&page_id) {
        state.selection.insert(page_id);
    }
    state.mark_dirty();
}

pub(crate) fn toggle_select_all(state: &mut AppState) {
    let selectable = state.pages.selectable_ids();
    if selectable.is_empty() {
        return;
    }
    if selectable.iter().all(|id| state.selection.contains(id)) {
        for id in &selectable {
            state.selection.remove(id);
        }
    } else {
        state.selection.extend(selectable);
    }
    state.mark_dirty();
}

pub(crate) fn view_page(state: &mut AppState, page_id: PageId) {
    let Some(page) = state
        .pages
        .get(page_id)
        .filter(|page| page.status.is_selectable())
    else {
        return;
    };
    state.viewed_text = page.ocr_text.clone();
    state.viewed = Some(page_id);
    state.text_edited = false;
    state.mark_dirty();
}

pub(crate) fn edit_viewed_text(state: &mut AppState, text: String) {
    let Some(page) = state
        .viewed
        .and_then(|id| state.pages.get_mut(id))
        .filter(|page| page.status != PageStatus::ProcessingExtraction)
    else {
        return;
    };
    page.ocr_text = text.clone();
    state.viewed_text = text;
    state.text_edited = true;
    state.mark_dirty();
}

pub(crate) fn change_language(state: &mut AppState, language: &str) {
    let language = language.trim();
    if language.is_empty() || language == state.language {
        return;
    }
    state.language = language.to_string();
    state.mark_dirty();
}

/// Puts a finished page back in line for the next extraction batch.
pub(crate) fn requeue_page(state: &mut AppState, page_id: PageId) {
    let Some(page) = state.pages.get_mut(page_id).filter(|page| {
        page.server_handle.is_some()
            && matches!(
                page.status,
                PageStatus::ExtractionDone | PageStatus::ExtractionError
            )
    }) else {
        return;
    };
    page.status = PageStatus::PendingExtraction;
    page.status_text = STATUS_READY.to_string();
    state.mark_dirty();
}
