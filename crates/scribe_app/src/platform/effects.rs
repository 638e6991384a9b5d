use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::{bail, Result};
use engine_logging::{engine_info, engine_warn};
use scribe_core::{
    Effect, JobId, JobKind, JobOutcome, JobReport, JobResult, Msg, SubmittedTask, UploadedFile,
};
use scribe_engine::wire::{
    AssemblyPage, AssemblyRequest, ExtractionBatchRequest, ExtractionPage, JobStatus,
    RemoteJobResult, ResultKind,
};
use scribe_engine::{EngineEvent, EngineHandle, UploadSource};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadFiles { upload_id, files } => {
                    engine_info!("UploadFiles upload_id={} files={}", upload_id, files.len());
                    let sources = files
                        .into_iter()
                        .map(|entry| UploadSource {
                            original_filename: entry.file.original_filename,
                            path: entry.file.path,
                        })
                        .collect();
                    self.engine.upload(upload_id, sources);
                }
                Effect::SubmitExtraction {
                    batch_id,
                    pages,
                    language,
                } => {
                    engine_info!(
                        "SubmitExtraction batch_id={} pages={} lang={}",
                        batch_id,
                        pages.len(),
                        language
                    );
                    let request = ExtractionBatchRequest {
                        pages_to_ocr: pages
                            .into_iter()
                            .map(|page| ExtractionPage {
                                temp_filename: page.server_handle,
                                original_filename: page.original_filename,
                            })
                            .collect(),
                        lang: language,
                    };
                    self.engine.submit_extraction(batch_id, request);
                }
                Effect::SubmitAssembly { pages } => {
                    engine_info!("SubmitAssembly pages={}", pages.len());
                    let request = AssemblyRequest {
                        files_to_process: pages
                            .into_iter()
                            .map(|page| AssemblyPage {
                                temp_filename: page.server_handle,
                                original_filename: page.original_filename,
                                lang: page.language,
                            })
                            .collect(),
                    };
                    self.engine.submit_assembly(request);
                }
                Effect::StartPolling => self.engine.start_polling(),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::PollJob { job_id } => self.engine.poll(job_id.as_str()),
                Effect::RetrieveDocument { filename } => {
                    engine_info!("RetrieveDocument filename={}", filename);
                    self.engine.save_document(filename);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event; `None` when nothing arrived.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>> {
        match self.engine.recv_timeout(timeout) {
            Ok(event) => Ok(Some(map_event(event))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => bail!("engine worker stopped unexpectedly"),
        }
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadFinished { upload_id, result } => Msg::UploadCompleted {
            upload_id,
            result: result
                .map(|files| {
                    files
                        .into_iter()
                        .map(|file| UploadedFile {
                            original_filename: file.original_filename,
                            server_handle: file.temp_filename,
                        })
                        .collect()
                })
                .map_err(|err| {
                    engine_warn!("Upload {} failed: {}", upload_id, err);
                    err.to_string()
                }),
        },
        EngineEvent::ExtractionSubmitted { batch_id, result } => Msg::ExtractionSubmitted {
            batch_id,
            result: result
                .map(|tasks| {
                    tasks
                        .into_iter()
                        .map(|task| SubmittedTask {
                            server_handle: task.temp_filename,
                            job_id: JobId::new(task.task_id),
                        })
                        .collect()
                })
                .map_err(|err| {
                    engine_warn!("Extraction batch {} failed: {}", batch_id, err);
                    err.to_string()
                }),
        },
        EngineEvent::AssemblySubmitted { result } => Msg::AssemblySubmitted {
            result: result.map(JobId::new).map_err(|err| {
                engine_warn!("Assembly submission failed: {}", err);
                err.to_string()
            }),
        },
        EngineEvent::PollTick => Msg::PollTick,
        EngineEvent::JobPolled { job_id, result } => {
            let result = result.map(map_status).map_err(|err| {
                engine_warn!("Status query for {} failed: {}", job_id, err);
                err.to_string()
            });
            Msg::PollCompleted {
                job_id: JobId::new(job_id),
                result,
            }
        }
        EngineEvent::DocumentSaved { filename, result } => Msg::DocumentSaved {
            result: result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
            filename,
        },
    }
}

fn map_status(status: JobStatus) -> JobReport {
    match status {
        JobStatus::Pending => JobReport::Pending,
        JobStatus::Finished { succeeded, result } => JobReport::Finished {
            outcome: if succeeded {
                JobOutcome::Succeeded
            } else {
                JobOutcome::Failed
            },
            result: map_result(result),
        },
    }
}

fn map_result(result: RemoteJobResult) -> JobResult {
    JobResult {
        kind: result.kind().map(|kind| match kind {
            ResultKind::Extraction => JobKind::Extraction,
            ResultKind::Assembly => JobKind::Assembly,
        }),
        worker_succeeded: result.worker_succeeded(),
        server_handle: result.temp_filename,
        text: result.text,
        language_used: result.lang_used,
        document_filename: result.merged_pdf_filename,
        error: result.error,
    }
}
