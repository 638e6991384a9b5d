#![allow(dead_code)]

use std::sync::Once;

use scribe_core::{
    update, AppState, Effect, ExtractionScope, JobId, JobOutcome, JobReport, JobResult, LocalFile,
    Msg, PageId, SubmittedTask, UploadedFile,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Uploads `(filename, server_handle)` pairs and acknowledges them all.
pub fn ingest(state: AppState, files: &[(&str, &str)]) -> AppState {
    let local = files.iter().map(|(name, _)| LocalFile::new(*name)).collect();
    let (state, effects) = update(state, Msg::UploadRequested(local));
    let upload_id = match effects.as_slice() {
        [Effect::UploadFiles { upload_id, .. }] => *upload_id,
        other => panic!("expected a single upload effect, got {other:?}"),
    };
    let uploaded = files
        .iter()
        .map(|(name, handle)| UploadedFile {
            original_filename: name.to_string(),
            server_handle: handle.to_string(),
        })
        .collect();
    let (state, _) = update(
        state,
        Msg::UploadCompleted {
            upload_id,
            result: Ok(uploaded),
        },
    );
    state
}

pub fn page_id(state: &AppState, handle: &str) -> PageId {
    state
        .pages()
        .find_by_handle(handle)
        .map(|page| page.id)
        .expect("page with handle")
}

/// Requests extraction and returns the batch id of the emitted submission.
pub fn request_extraction(state: AppState, scope: ExtractionScope) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::ExtractionRequested { scope });
    let batch_id = match effects.as_slice() {
        [Effect::SubmitExtraction { batch_id, .. }] => *batch_id,
        other => panic!("expected a single submission effect, got {other:?}"),
    };
    (state, batch_id)
}

pub fn tasks(pairs: &[(&str, &str)]) -> Vec<SubmittedTask> {
    pairs
        .iter()
        .map(|(handle, job)| SubmittedTask {
            server_handle: handle.to_string(),
            job_id: JobId::from(*job),
        })
        .collect()
}

/// Submits extraction for all pages and acknowledges with `(handle, job)` pairs.
pub fn extract_all(state: AppState, pairs: &[(&str, &str)]) -> (AppState, Vec<Effect>) {
    let (state, batch_id) = request_extraction(state, ExtractionScope::All);
    update(
        state,
        Msg::ExtractionSubmitted {
            batch_id,
            result: Ok(tasks(pairs)),
        },
    )
}

pub fn extraction_success(handle: &str, text: &str) -> Result<JobReport, String> {
    Ok(JobReport::Finished {
        outcome: JobOutcome::Succeeded,
        result: JobResult {
            server_handle: Some(handle.to_string()),
            worker_succeeded: Some(true),
            text: Some(text.to_string()),
            ..JobResult::default()
        },
    })
}

pub fn extraction_failure(handle: &str, error: Option<&str>) -> Result<JobReport, String> {
    Ok(JobReport::Finished {
        outcome: JobOutcome::Succeeded,
        result: JobResult {
            server_handle: Some(handle.to_string()),
            worker_succeeded: Some(false),
            error: error.map(str::to_string),
            ..JobResult::default()
        },
    })
}

pub fn poll(state: AppState, job: &str, result: Result<JobReport, String>) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::PollCompleted {
            job_id: JobId::from(job),
            result,
        },
    )
}
