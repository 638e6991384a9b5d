mod common;

use common::*;
use pretty_assertions::assert_eq;
use scribe_core::{
    update, AppState, Effect, ExtractionRequestPage, ExtractionScope, JobId, NoticeLevel, Msg,
    PageStatus,
};

fn two_pages() -> AppState {
    ingest(AppState::new(), &[("a.png", "f1"), ("b.png", "f2")])
}

#[test]
fn submission_marks_pages_processing_and_carries_language() {
    init_logging();
    let (state, _) = update(two_pages(), Msg::LanguageChanged("eng".to_string()));
    let (state, effects) = update(
        state,
        Msg::ExtractionRequested {
            scope: ExtractionScope::All,
        },
    );

    assert_eq!(
        effects,
        vec![Effect::SubmitExtraction {
            batch_id: 1,
            pages: vec![
                ExtractionRequestPage {
                    server_handle: "f1".to_string(),
                    original_filename: "a.png".to_string(),
                },
                ExtractionRequestPage {
                    server_handle: "f2".to_string(),
                    original_filename: "b.png".to_string(),
                },
            ],
            language: "eng".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.count_status(PageStatus::ProcessingExtraction), 2);
    assert!(view.pages.iter().all(|row| !row.selectable));
    assert_eq!(view.submitting_batches, 1);
}

#[test]
fn acknowledged_batch_registers_one_job_per_page_and_starts_polling() {
    init_logging();
    let (state, effects) = extract_all(two_pages(), &[("f1", "j1"), ("f2", "j2")]);

    assert_eq!(effects, vec![Effect::StartPolling]);
    assert_eq!(
        state.registry().outstanding(),
        vec![JobId::from("j1"), JobId::from("j2")]
    );
    let view = state.view();
    assert_eq!(view.outstanding_jobs, 2);
    assert_eq!(view.submitting_batches, 0);
    assert!(view.polling);
    for row in &view.pages {
        assert_eq!(row.status, PageStatus::ProcessingExtraction);
        assert!(row.status_text.starts_with("Queued"));
    }
}

#[test]
fn processing_pages_are_not_resubmitted() {
    init_logging();
    let (state, _) = extract_all(two_pages(), &[("f1", "j1"), ("f2", "j2")]);
    let (state, effects) = update(
        state,
        Msg::ExtractionRequested {
            scope: ExtractionScope::All,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.registry().len(), 2);
    assert_eq!(
        state.view().notice.unwrap().text,
        "No pages need extraction."
    );
}

#[test]
fn transport_failure_rolls_back_every_page_verbatim() {
    init_logging();
    // f1 fails once so that the batch mixes pending and error pages.
    let (state, _) = extract_all(two_pages(), &[("f1", "j1")]);
    let (state, _) = poll(state, "j1", extraction_failure("f1", Some("blurry")));
    let before = state.view();
    let error_row = before.pages[0].clone();
    assert_eq!(error_row.status, PageStatus::ExtractionError);

    let (state, batch_id) = request_extraction(state, ExtractionScope::All);
    let (mut state, effects) = update(
        state,
        Msg::ExtractionSubmitted {
            batch_id,
            result: Err("connection refused".to_string()),
        },
    );

    assert!(effects.is_empty());
    let after = state.view();
    for (old, new) in before.pages.iter().zip(&after.pages) {
        assert_eq!(old.status, new.status);
        assert_eq!(old.status_text, new.status_text);
    }
    assert_eq!(after.pages[0], error_row);
    assert!(state.registry().is_empty());
    let notice = after.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("connection refused"));
    assert!(state
        .drain_notices()
        .iter()
        .any(|notice| notice.level == NoticeLevel::Error));
}

#[test]
fn pages_missing_from_the_response_are_rolled_back() {
    init_logging();
    let (state, effects) = extract_all(two_pages(), &[("f2", "j2")]);

    assert_eq!(effects, vec![Effect::StartPolling]);
    assert_eq!(state.registry().outstanding(), vec![JobId::from("j2")]);
    let view = state.view();
    let first = view.page(page_id(&state, "f1")).unwrap();
    assert_eq!(first.status, PageStatus::PendingExtraction);
    assert_eq!(first.status_text, "Ready for extraction");
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.text, "1 of 2 page(s) were not accepted for extraction.");
}

#[test]
fn selected_scope_only_submits_selected_pages() {
    init_logging();
    let state = two_pages();
    let second = page_id(&state, "f2");
    let (state, _) = update(state, Msg::PageSelectionToggled(second));
    let (_state, effects) = update(
        state,
        Msg::ExtractionRequested {
            scope: ExtractionScope::Selected,
        },
    );

    match effects.as_slice() {
        [Effect::SubmitExtraction { pages, .. }] => {
            assert_eq!(pages.len(), 1);
            assert_eq!(pages[0].server_handle, "f2");
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn empty_selection_reports_nothing_to_do() {
    init_logging();
    let (state, effects) = update(
        two_pages(),
        Msg::ExtractionRequested {
            scope: ExtractionScope::Selected,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().count_status(PageStatus::PendingExtraction), 2);
    assert_eq!(
        state.view().notice.unwrap().text,
        "The selected pages do not need extraction."
    );
}

#[test]
fn successful_result_stores_text_as_current_and_baseline() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let (state, effects) = poll(state, "j1", extraction_success("f1", "hello world"));

    assert_eq!(effects, vec![Effect::StopPolling]);
    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.status, PageStatus::ExtractionDone);
    assert_eq!(page.ocr_text, "hello world");
    assert_eq!(page.original_ocr_text, "hello world");
    assert_eq!(page.language_used.as_deref(), Some("vie"));
    assert!(state.registry().is_empty());
}

#[test]
fn reported_language_wins_over_requested_language() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let report = Ok(scribe_core::JobReport::Finished {
        outcome: scribe_core::JobOutcome::Succeeded,
        result: scribe_core::JobResult {
            server_handle: Some("f1".to_string()),
            worker_succeeded: Some(true),
            text: Some("xin chào".to_string()),
            language_used: Some("vie+eng".to_string()),
            ..scribe_core::JobResult::default()
        },
    });
    let (state, _) = poll(state, "j1", report);

    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.language_used.as_deref(), Some("vie+eng"));
}

#[test]
fn blank_text_counts_as_failure() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let (state, _) = poll(state, "j1", extraction_success("f1", "  \n "));

    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.status, PageStatus::ExtractionError);
    assert_eq!(page.status_text, "Error: unknown error");
    assert!(page.ocr_text.is_empty());
}

#[test]
fn failed_result_truncates_error_excerpt() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let long_error = "x".repeat(200);
    let (state, _) = poll(state, "j1", extraction_failure("f1", Some(&long_error)));

    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.status, PageStatus::ExtractionError);
    assert_eq!(page.status_text, format!("Error: {}", "x".repeat(80)));
}

#[test]
fn error_pages_can_be_submitted_again() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let (state, _) = poll(state, "j1", extraction_failure("f1", None));
    let (state, effects) = extract_all(state, &[("f1", "j7")]);

    assert_eq!(effects, vec![Effect::StartPolling]);
    assert_eq!(state.registry().outstanding(), vec![JobId::from("j7")]);
}

#[test]
fn acknowledgement_for_unknown_batch_is_ignored() {
    init_logging();
    let state = two_pages();
    let before = state.view();
    let (state, effects) = update(
        state,
        Msg::ExtractionSubmitted {
            batch_id: 42,
            result: Ok(tasks(&[("f1", "j1")])),
        },
    );

    assert!(effects.is_empty());
    assert!(state.registry().is_empty());
    assert_eq!(state.view().pages, before.pages);
}

#[test]
fn result_without_handle_completes_the_submitted_page() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let report = Ok(scribe_core::JobReport::Finished {
        outcome: scribe_core::JobOutcome::Succeeded,
        result: scribe_core::JobResult {
            text: Some("no handle here".to_string()),
            ..scribe_core::JobResult::default()
        },
    });
    let (state, effects) = poll(state, "j1", report);

    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.status, PageStatus::ExtractionDone);
    assert_eq!(page.ocr_text, "no handle here");
    assert_eq!(effects, vec![Effect::StopPolling]);
}

#[test]
fn result_reporting_another_handle_completes_the_submitted_page() {
    init_logging();
    let (state, _) = extract_all(two_pages(), &[("f1", "j1"), ("f2", "j2")]);
    let (state, _) = poll(state, "j1", extraction_success("f2", "text for one"));

    let first = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(first.status, PageStatus::ExtractionDone);
    assert_eq!(first.ocr_text, "text for one");
    let second = state.pages().find_by_handle("f2").unwrap();
    assert_eq!(second.status, PageStatus::ProcessingExtraction);
    assert!(state.registry().contains(&JobId::from("j2")));
}

#[test]
fn document_result_for_a_page_job_fails_the_page() {
    init_logging();
    let state = ingest(AppState::new(), &[("page1.png", "f1")]);
    let (state, _) = extract_all(state, &[("f1", "j1")]);
    let report = Ok(scribe_core::JobReport::Finished {
        outcome: scribe_core::JobOutcome::Succeeded,
        result: scribe_core::JobResult {
            kind: Some(scribe_core::JobKind::Assembly),
            document_filename: Some("book.pdf".to_string()),
            ..scribe_core::JobResult::default()
        },
    });
    let (state, _) = poll(state, "j1", report);

    let page = state.pages().find_by_handle("f1").unwrap();
    assert_eq!(page.status, PageStatus::ExtractionError);
    assert_eq!(page.status_text, "Error: unexpected result kind");
    assert!(state.registry().is_empty());
}
