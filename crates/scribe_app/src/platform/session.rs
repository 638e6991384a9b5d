use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use engine_logging::{engine_error, engine_info, engine_warn};
use scribe_core::{
    update, AppState, CoreSettings, ExtractionScope, LocalFile, Msg, Notice, NoticeLevel,
    PageStatus,
};

use super::effects::EffectRunner;
use super::persistence::write_transcripts;

const EVENT_WAIT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub core: CoreSettings,
    pub output_dir: PathBuf,
    pub assemble: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uploading,
    Extracting,
    Assembling,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub pages: usize,
    pub extracted: usize,
    pub failed: usize,
    pub transcripts: Vec<PathBuf>,
    pub document: Option<String>,
}

/// Drives one batch end to end: upload, extract every page, then optionally assemble.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    settings: SessionSettings,
    phase: Phase,
    document: Option<String>,
}

impl Session {
    pub fn new(runner: EffectRunner, settings: SessionSettings) -> Self {
        Self {
            state: AppState::with_settings(settings.core.clone()),
            runner,
            settings,
            phase: Phase::Uploading,
            document: None,
        }
    }

    pub fn run(mut self, files: Vec<PathBuf>) -> Result<SessionSummary> {
        let started = Instant::now();
        let files = files.into_iter().map(LocalFile::new).collect();
        self.dispatch(Msg::UploadRequested(files));
        if self.state.pages().is_empty() {
            bail!("none of the given files is a supported image");
        }

        while self.phase != Phase::Finished {
            if let Some(limit) = self.settings.timeout {
                if started.elapsed() > limit {
                    bail!(
                        "session did not settle within {:?} ({} job(s) outstanding)",
                        limit,
                        self.state.registry().len()
                    );
                }
            }
            if let Some(msg) = self.runner.next_msg(EVENT_WAIT)? {
                self.dispatch(msg);
            }
            self.advance();
        }

        Ok(self.finish())
    }

    fn dispatch(&mut self, msg: Msg) {
        if let Msg::DocumentSaved {
            result: Ok(location),
            ..
        } = &msg
        {
            self.document = Some(location.clone());
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        for notice in state.drain_notices() {
            log_notice(&notice);
        }
        state.consume_dirty();
        self.state = state;
        self.runner.run(effects);
    }

    /// Moves to the next phase each time the state settles.
    fn advance(&mut self) {
        while self.phase != Phase::Finished && self.state.view().is_settled() {
            let (next, msg) = match self.phase {
                Phase::Uploading => (
                    Phase::Extracting,
                    Some(Msg::ExtractionRequested {
                        scope: ExtractionScope::All,
                    }),
                ),
                Phase::Extracting if self.settings.assemble => {
                    (Phase::Assembling, Some(Msg::AssemblyRequested))
                }
                Phase::Extracting | Phase::Assembling | Phase::Finished => (Phase::Finished, None),
            };
            engine_info!("Session phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
            if let Some(msg) = msg {
                self.dispatch(msg);
            }
        }
    }

    fn finish(self) -> SessionSummary {
        let view = self.state.view();
        let transcripts = write_transcripts(&self.settings.output_dir, &self.state.transcripts());
        let summary = SessionSummary {
            pages: view.pages.len(),
            extracted: view.count_status(PageStatus::ExtractionDone),
            failed: view.count_status(PageStatus::ExtractionError),
            transcripts,
            document: self.document,
        };
        engine_info!(
            "Session finished: {} page(s), {} extracted, {} failed, {} transcript(s)",
            summary.pages,
            summary.extracted,
            summary.failed,
            summary.transcripts.len()
        );
        summary
    }
}

fn log_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info | NoticeLevel::Success => engine_info!("{}", notice.text),
        NoticeLevel::Warning => engine_warn!("{}", notice.text),
        NoticeLevel::Error => engine_error!("{}", notice.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use scribe_engine::wire::{
        AssemblyRequest, ExtractionBatchRequest, JobStatus, RemoteJobResult, SubmittedTask,
        UploadedFile,
    };
    use scribe_engine::{
        BackendError, BackendSettings, EngineConfig, EngineHandle, FailureKind, JobBackend,
        UploadSource,
    };
    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Accepts everything; extraction of a handle containing "bad" fails.
    struct ScriptedBackend;

    #[async_trait::async_trait]
    impl JobBackend for ScriptedBackend {
        async fn upload(&self, files: &[UploadSource]) -> Result<Vec<UploadedFile>, BackendError> {
            Ok(files
                .iter()
                .map(|file| UploadedFile {
                    original_filename: file.original_filename.clone(),
                    temp_filename: format!("tmp_{}", file.original_filename),
                })
                .collect())
        }

        async fn submit_extraction(
            &self,
            request: &ExtractionBatchRequest,
        ) -> Result<Vec<SubmittedTask>, BackendError> {
            Ok(request
                .pages_to_ocr
                .iter()
                .map(|page| SubmittedTask {
                    temp_filename: page.temp_filename.clone(),
                    task_id: format!("job:{}", page.temp_filename),
                })
                .collect())
        }

        async fn submit_assembly(&self, _request: &AssemblyRequest) -> Result<String, BackendError> {
            Ok("assembly".to_string())
        }

        async fn job_status(&self, job_id: &str) -> Result<JobStatus, BackendError> {
            if job_id == "assembly" {
                return Ok(JobStatus::Finished {
                    succeeded: true,
                    result: RemoteJobResult {
                        merged_pdf_filename: Some("merged_book.pdf".to_string()),
                        ..RemoteJobResult::default()
                    },
                });
            }
            let handle = job_id.trim_start_matches("job:").to_string();
            let failed = handle.contains("bad");
            Ok(JobStatus::Finished {
                succeeded: !failed,
                result: RemoteJobResult {
                    status: Some(if failed { "failure" } else { "success" }.to_string()),
                    text: (!failed).then(|| format!("text of {handle}")),
                    lang_used: Some("vie".to_string()),
                    error: failed.then(|| "unreadable".to_string()),
                    temp_filename: Some(handle),
                    ..RemoteJobResult::default()
                },
            })
        }

        async fn retrieve_document(&self, filename: &str) -> Result<Vec<u8>, BackendError> {
            if filename == "merged_book.pdf" {
                Ok(b"%PDF".to_vec())
            } else {
                Err(BackendError {
                    kind: FailureKind::HttpStatus(404),
                    message: "404 Not Found".to_string(),
                })
            }
        }
    }

    fn session(output: &TempDir, assemble: bool) -> Session {
        let settings = BackendSettings::new(Url::parse("http://127.0.0.1:9").unwrap());
        let config = EngineConfig {
            poll_interval: Duration::from_millis(10),
            ..EngineConfig::new(settings, output.path())
        };
        let engine = EngineHandle::with_backend(Arc::new(ScriptedBackend), config).unwrap();
        session_over(engine, output, assemble)
    }

    fn session_over(engine: EngineHandle, output: &TempDir, assemble: bool) -> Session {
        Session::new(
            EffectRunner::new(engine),
            SessionSettings {
                core: CoreSettings::default(),
                output_dir: output.path().to_path_buf(),
                assemble,
                timeout: Some(Duration::from_secs(10)),
            },
        )
    }

    #[test]
    fn extraction_only_session_writes_transcripts() {
        let output = TempDir::new().unwrap();
        let summary = session(&output, false)
            .run(vec![PathBuf::from("p1.png"), PathBuf::from("p2.png")])
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.transcripts.len(), 2);
        assert_eq!(
            fs::read_to_string(&summary.transcripts[0]).unwrap(),
            "text of tmp_p1.png"
        );
        assert!(summary.document.is_none());
    }

    #[test]
    fn assembling_session_downloads_the_document() {
        let output = TempDir::new().unwrap();
        let summary = session(&output, true)
            .run(vec![PathBuf::from("p1.png"), PathBuf::from("bad.png")])
            .unwrap();

        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.transcripts.len(), 1);
        let document = output.path().join("merged_book.pdf");
        assert_eq!(summary.document, Some(document.display().to_string()));
        assert_eq!(fs::read(document).unwrap(), b"%PDF");
    }

    #[test]
    fn non_image_inputs_are_refused() {
        let output = TempDir::new().unwrap();
        let err = session(&output, false)
            .run(vec![PathBuf::from("notes.txt")])
            .unwrap_err();
        assert!(err.to_string().contains("supported image"));
    }

    async fn mount_json(
        server: &MockServer,
        http_method: &str,
        route: &str,
        body: serde_json::Value,
    ) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn session_settles_against_an_http_backend() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            mount_json(
                &server,
                "POST",
                "/upload/",
                json!({
                    "uploaded_files": [
                        { "original_filename": "p1.png", "temp_filename": "t_p1.png" },
                        { "original_filename": "p2.png", "temp_filename": "t_p2.png" }
                    ]
                }),
            )
            .await;
            mount_json(
                &server,
                "POST",
                "/ocr-multiple-pages/",
                json!({
                    "message": "Submitted 2 OCR tasks.",
                    "submitted_tasks": [
                        { "temp_filename": "t_p1.png", "task_id": "j1" },
                        { "temp_filename": "t_p2.png", "task_id": "j2" }
                    ]
                }),
            )
            .await;
            mount_json(
                &server,
                "GET",
                "/task-status/j1",
                json!({
                    "task_id": "j1",
                    "status": "SUCCESS",
                    "result": {
                        "status": "success",
                        "text": "hello world",
                        "temp_filename": "t_p1.png",
                        "lang_used": "vie"
                    }
                }),
            )
            .await;
            mount_json(
                &server,
                "GET",
                "/task-status/j2",
                json!({ "task_id": "j2", "status": "FAILURE", "result": { "error": "boom" } }),
            )
            .await;
            mount_json(
                &server,
                "POST",
                "/generate-book-pdf-async/",
                json!({ "message": "Book PDF generation started.", "task_id": "a1" }),
            )
            .await;
            mount_json(
                &server,
                "GET",
                "/task-status/a1",
                json!({
                    "task_id": "a1",
                    "status": "SUCCESS",
                    "result": {
                        "status": "success",
                        "message": "Merged PDF generated.",
                        "merged_pdf_filename": "merged_book_a1.pdf"
                    }
                }),
            )
            .await;
            Mock::given(method("GET"))
                .and(path("/download-generated-pdf/merged_book_a1.pdf"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_raw("%PDF-1.7", "application/pdf"),
                )
                .mount(&server)
                .await;
            server
        });

        let input = TempDir::new().unwrap();
        let files: Vec<PathBuf> = ["p1.png", "p2.png"]
            .iter()
            .map(|name| {
                let file = input.path().join(name);
                fs::write(&file, b"\x89PNG").unwrap();
                file
            })
            .collect();

        let output = TempDir::new().unwrap();
        let settings = BackendSettings::new(Url::parse(&server.uri()).unwrap());
        let config = EngineConfig {
            poll_interval: Duration::from_millis(10),
            ..EngineConfig::new(settings, output.path())
        };
        let summary = session_over(EngineHandle::new(config).unwrap(), &output, true)
            .run(files)
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.transcripts.len(), 1);
        assert_eq!(
            fs::read_to_string(&summary.transcripts[0]).unwrap(),
            "hello world"
        );
        let document = output.path().join("merged_book_a1.pdf");
        assert_eq!(summary.document, Some(document.display().to_string()));
        assert_eq!(fs::read(document).unwrap(), b"%PDF-1.7");
    }
}
