use crate::{dispatch, ingest, submit, AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UploadRequested(files) => ingest::request_upload(&mut state, files),
        Msg::UploadCompleted { upload_id, result } => {
            ingest::complete_upload(&mut state, upload_id, result);
            Vec::new()
        }
        Msg::PageSelectionToggled(page_id) => {
            ingest::toggle_selection(&mut state, page_id);
            Vec::new()
        }
        Msg::SelectAllToggled => {
            ingest::toggle_select_all(&mut state);
            Vec::new()
        }
        Msg::PageViewed(page_id) => {
            ingest::view_page(&mut state, page_id);
            Vec::new()
        }
        Msg::ViewedTextEdited(text) => {
            ingest::edit_viewed_text(&mut state, text);
            Vec::new()
        }
        Msg::LanguageChanged(language) => {
            ingest::change_language(&mut state, &language);
            Vec::new()
        }
        Msg::PageRequeued(page_id) => {
            ingest::requeue_page(&mut state, page_id);
            Vec::new()
        }
        Msg::ExtractionRequested { scope } => submit::request_extraction(&mut state, scope),
        Msg::ExtractionSubmitted { batch_id, result } => {
            submit::complete_extraction_submission(&mut state, batch_id, result)
        }
        Msg::AssemblyRequested => submit::request_assembly(&mut state),
        Msg::AssemblySubmitted { result } => submit::complete_assembly_submission(&mut state, result),
        Msg::PollTick => dispatch::poll_tick(&mut state),
        Msg::PollCompleted { job_id, result } => {
            dispatch::poll_completed(&mut state, job_id, result)
        }
        Msg::DocumentSaved { filename, result } => {
            dispatch::document_saved(&mut state, filename, result);
            Vec::new()
        }
    };

    (state, effects)
}
