//! Extraction-batch and assembly submission.
//!
//! Both flows mutate state optimistically before the request leaves. An
//! extraction batch keeps a snapshot of every page it touched so that a
//! failed submission restores those pages verbatim.

use engine_logging::{engine_info, engine_warn};

use crate::page::{STATUS_QUEUED, STATUS_SUBMITTING};
use crate::registry::ExtractionTicket;
use crate::state::{PageSnapshot, PendingBatch};
use crate::{
    AppState, AssemblyRequestPage, BatchId, Effect, ExtractionRequestPage, ExtractionScope,
    JobId, NoticeLevel, PageStatus, SubmittedTask,
};

pub(crate) fn request_extraction(state: &mut AppState, scope: ExtractionScope) -> Vec<Effect> {
    let candidates: Vec<_> = state
        .pages
        .iter()
        .filter(|page| scope == ExtractionScope::All || state.selection.contains(&page.id))
        .filter(|page| page.server_handle.is_some() && page.status.is_submittable())
        .map(|page| page.id)
        .collect();

    if candidates.is_empty() {
        let text = match scope {
            ExtractionScope::All => "No pages need extraction.",
            ExtractionScope::Selected => "The selected pages do not need extraction.",
        };
        state.notify(NoticeLevel::Info, text);
        return Vec::new();
    }

    let language = state.language.clone();
    let mut snapshots = Vec::with_capacity(candidates.len());
    let mut pages = Vec::with_capacity(candidates.len());
    for page_id in candidates {
        let Some(page) = state.pages.get_mut(page_id) else {
            continue;
        };
        let Some(handle) = page.server_handle.clone() else {
            continue;
        };
        snapshots.push(PageSnapshot {
            page_id,
            server_handle: handle.clone(),
            status: page.status,
            status_text: page.status_text.clone(),
        });
        pages.push(ExtractionRequestPage {
            server_handle: handle,
            original_filename: page.original_filename.clone(),
        });
        page.status = PageStatus::ProcessingExtraction;
        page.status_text = STATUS_SUBMITTING.to_string();
    }

    state.next_batch_id += 1;
    let batch_id = state.next_batch_id;
    state.pending_batches.insert(
        batch_id,
        PendingBatch {
            language: language.clone(),
            snapshots,
        },
    );
    state.mark_dirty();

    engine_info!(
        "Submitting extraction batch {} with {} page(s), language={}",
        batch_id,
        pages.len(),
        language
    );
    vec![Effect::SubmitExtraction {
        batch_id,
        pages,
        language,
    }]
}

pub(crate) fn complete_extraction_submission(
    state: &mut AppState,
    batch_id: BatchId,
    result: Result<Vec<SubmittedTask>, String>,
) -> Vec<Effect> {
    let Some(batch) = state.pending_batches.remove(&batch_id) else {
        engine_warn!("Ignoring acknowledgement for unknown batch {}", batch_id);
        return Vec::new();
    };
    state.mark_dirty();

    let tasks = match result {
        Ok(tasks) => tasks,
        Err(err) => {
            engine_warn!(
                "Extraction batch {} failed to submit ({}); rolling back {} page(s)",
                batch_id,
                err,
                batch.snapshots.len()
            );
            restore(state, &batch.snapshots);
            state.notify(
                NoticeLevel::Error,
                format!("Extraction submission failed: {err}"),
            );
            return Vec::new();
        }
    };

    let mut accepted = 0usize;
    let mut rejected = Vec::new();
    for snapshot in &batch.snapshots {
        let registered = tasks
            .iter()
            .find(|task| task.server_handle == snapshot.server_handle)
            .is_some_and(|task| {
                state.registry.insert_extraction(
                    task.job_id.clone(),
                    ExtractionTicket {
                        server_handle: snapshot.server_handle.clone(),
                        language: batch.language.clone(),
                    },
                )
            });
        if registered {
            if let Some(page) = state.pages.get_mut(snapshot.page_id) {
                page.status_text = STATUS_QUEUED.to_string();
            }
            accepted += 1;
        } else {
            rejected.push(snapshot.clone());
        }
    }

    if rejected.is_empty() {
        engine_info!("Extraction batch {} queued {} job(s)", batch_id, accepted);
        state.notify(
            NoticeLevel::Info,
            format!("Extraction submitted for {accepted} page(s)."),
        );
    } else {
        engine_warn!(
            "Extraction batch {}: {} page(s) got no job handle; rolling them back",
            batch_id,
            rejected.len()
        );
        restore(state, &rejected);
        state.notify(
            NoticeLevel::Warning,
            format!(
                "{} of {} page(s) were not accepted for extraction.",
                rejected.len(),
                batch.snapshots.len()
            ),
        );
    }

    let mut effects = Vec::new();
    state.sync_polling(&mut effects);
    effects
}

fn restore(state: &mut AppState, snapshots: &[PageSnapshot]) {
    for snapshot in snapshots {
        if let Some(page) = state.pages.get_mut(snapshot.page_id) {
            page.status = snapshot.status;
            page.status_text = snapshot.status_text.clone();
        }
    }
}

pub(crate) fn request_assembly(state: &mut AppState) -> Vec<Effect> {
    if state.generating || state.registry.assembly().is_some() {
        state.notify(NoticeLevel::Info, "A document job is already running.");
        return Vec::new();
    }

    let pages: Vec<AssemblyRequestPage> = state
        .pages
        .iter()
        .filter_map(|page| {
            Some(AssemblyRequestPage {
                server_handle: page.server_handle.clone()?,
                original_filename: page.original_filename.clone(),
                language: page
                    .language_used
                    .clone()
                    .filter(|language| !language.is_empty())
                    .unwrap_or_else(|| state.language.clone()),
            })
        })
        .collect();
    if pages.is_empty() {
        state.notify(NoticeLevel::Info, "No pages available to build a document.");
        return Vec::new();
    }
    if state.pages.any_processing_extraction() {
        state.notify(
            NoticeLevel::Info,
            "Wait until every page has finished extraction.",
        );
        return Vec::new();
    }

    state.generating = true;
    state.mark_dirty();
    engine_info!("Submitting document assembly for {} page(s)", pages.len());
    vec![Effect::SubmitAssembly { pages }]
}

pub(crate) fn complete_assembly_submission(
    state: &mut AppState,
    result: Result<JobId, String>,
) -> Vec<Effect> {
    if !state.generating {
        engine_warn!("Ignoring assembly acknowledgement with no submission in flight");
        return Vec::new();
    }
    state.mark_dirty();

    match result {
        Ok(job_id) => {
            if state.registry.occupy_assembly(job_id.clone()) {
                engine_info!("Document assembly queued as job {}", job_id);
                state.notify(NoticeLevel::Info, "Document generation submitted.");
            } else {
                engine_warn!("Assembly job {} collides with an outstanding job", job_id);
                state.generating = false;
                state.notify(
                    NoticeLevel::Error,
                    "Document submission returned a job that is already tracked.",
                );
            }
        }
        Err(err) => {
            engine_warn!("Document assembly failed to submit: {}", err);
            state.generating = false;
            state.notify(
                NoticeLevel::Error,
                format!("Document submission failed: {err}"),
            );
        }
    }

    let mut effects = Vec::new();
    state.sync_polling(&mut effects);
    effects
}
