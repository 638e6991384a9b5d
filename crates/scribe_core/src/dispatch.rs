//! Poll fan-out and terminal result dispatch.

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::page::STATUS_DONE;
use crate::registry::{ExtractionTicket, RetiredTask};
use crate::{
    AppState, Effect, JobId, JobKind, JobOutcome, JobReport, JobResult, NoticeLevel, PageStatus,
};

/// Longest error excerpt shown in a page's status text, in characters.
pub const MAX_ERROR_EXCERPT: usize = 80;

const UNKNOWN_ERROR: &str = "unknown error";
const UNEXPECTED_KIND: &str = "unexpected result kind";

pub(crate) fn poll_tick(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.registry.is_empty() {
        state.sync_polling(&mut effects);
        return effects;
    }
    let outstanding = state.registry.outstanding();
    engine_debug!("Polling {} outstanding job(s)", outstanding.len());
    effects.extend(
        outstanding
            .into_iter()
            .map(|job_id| Effect::PollJob { job_id }),
    );
    effects
}

pub(crate) fn poll_completed(
    state: &mut AppState,
    job_id: JobId,
    result: Result<JobReport, String>,
) -> Vec<Effect> {
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            engine_warn!("Status query for job {} failed: {}", job_id, err);
            return Vec::new();
        }
    };

    if !state.registry.contains(&job_id) {
        engine_debug!("Ignoring status for job {}: no longer outstanding", job_id);
        return Vec::new();
    }

    let (outcome, result) = match report {
        JobReport::Pending => {
            if state.registry.mark_assembly_running(&job_id) {
                state.mark_dirty();
            }
            return Vec::new();
        }
        JobReport::Finished { outcome, result } => (outcome, result),
    };

    let Some(retired) = state.registry.retire(&job_id) else {
        return Vec::new();
    };
    engine_info!("Job {} finished with {:?}", job_id, outcome);

    let mut effects = Vec::new();
    match retired {
        RetiredTask::Extraction(ticket) => {
            let outcome = match result.kind {
                Some(JobKind::Assembly) => {
                    engine_warn!("Extraction job {} returned a document result", job_id);
                    None
                }
                _ => Some(outcome),
            };
            complete_extraction(state, outcome, result, &ticket);
        }
        RetiredTask::Assembly(_) => {
            let outcome = match result.kind {
                Some(JobKind::Extraction) => {
                    engine_warn!("Document job {} returned a page result", job_id);
                    None
                }
                _ => Some(outcome),
            };
            complete_assembly(state, outcome, result, &mut effects);
        }
    }

    state.mark_dirty();
    state.sync_polling(&mut effects);
    effects
}

/// `outcome` is `None` when the result declares the other job kind; the job
/// still retires, as a failure of its registered kind.
fn complete_extraction(
    state: &mut AppState,
    outcome: Option<JobOutcome>,
    result: JobResult,
    ticket: &ExtractionTicket,
) {
    if let Some(reported) = result.server_handle.as_deref() {
        if reported != ticket.server_handle {
            engine_warn!(
                "Result for handle {} reports handle {}; using the submitted handle",
                ticket.server_handle,
                reported
            );
        }
    }
    let Some(page) = state.pages.find_by_handle_mut(&ticket.server_handle) else {
        engine_info!(
            "No page holds handle {}; extraction result dropped",
            ticket.server_handle
        );
        return;
    };

    let text = result.text.unwrap_or_default();
    let succeeded = outcome == Some(JobOutcome::Succeeded)
        && result.worker_succeeded != Some(false)
        && !text.trim().is_empty();
    if succeeded {
        page.original_ocr_text = text.clone();
        page.ocr_text = text;
        page.status = PageStatus::ExtractionDone;
        page.status_text = STATUS_DONE.to_string();
        page.language_used = Some(
            result
                .language_used
                .filter(|language| !language.is_empty())
                .unwrap_or_else(|| ticket.language.clone()),
        );
    } else {
        let error = match outcome {
            Some(_) => result.error,
            None => Some(UNEXPECTED_KIND.to_string()),
        };
        page.status = PageStatus::ExtractionError;
        page.status_text = error_status_text(error.as_deref());
    }

    let page_id = page.id;
    state.refresh_viewed(page_id);
}

fn complete_assembly(
    state: &mut AppState,
    outcome: Option<JobOutcome>,
    result: JobResult,
    effects: &mut Vec<Effect>,
) {
    state.generating = false;
    let filename = result
        .document_filename
        .filter(|filename| !filename.trim().is_empty());
    let succeeded = outcome == Some(JobOutcome::Succeeded) && result.worker_succeeded != Some(false);

    match (succeeded, filename) {
        (true, Some(filename)) => {
            state.notify(
                NoticeLevel::Success,
                format!("Document {filename} generated; downloading."),
            );
            state.saving_document = Some(filename.clone());
            effects.push(Effect::RetrieveDocument { filename });
        }
        _ => {
            let error = match outcome {
                Some(_) => result.error,
                None => Some(UNEXPECTED_KIND.to_string()),
            };
            let reason = error
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            state.notify(
                NoticeLevel::Error,
                format!("Document generation failed: {reason}"),
            );
        }
    }
}

pub(crate) fn document_saved(state: &mut AppState, filename: String, result: Result<String, String>) {
    if state.saving_document.as_deref() == Some(filename.as_str()) {
        state.saving_document = None;
    }
    match result {
        Ok(location) => {
            engine_info!("Document {} saved to {}", filename, location);
            state.notify(NoticeLevel::Success, format!("Saved {location}."));
        }
        Err(err) => {
            engine_warn!("Document {} could not be saved: {}", filename, err);
            state.notify(
                NoticeLevel::Error,
                format!("Could not download {filename}: {err}"),
            );
        }
    }
}

fn error_status_text(error: Option<&str>) -> String {
    let excerpt: String = match error.map(str::trim).filter(|error| !error.is_empty()) {
        Some(error) => error.chars().take(MAX_ERROR_EXCERPT).collect(),
        None => UNKNOWN_ERROR.to_string(),
    };
    format!("Error: {excerpt}")
}
