use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::backend::{BackendSettings, JobBackend, ReqwestBackend, UploadSource};
use crate::persist::OutputWriter;
use crate::timer::{PollTimer, DEFAULT_POLL_INTERVAL};
use crate::wire::{AssemblyRequest, ExtractionBatchRequest};
use crate::{BatchId, EngineError, EngineEvent, SaveError, UploadId};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
}

impl EngineConfig {
    pub fn new(backend: BackendSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_dir: output_dir.into(),
        }
    }
}

enum EngineCommand {
    StartPolling,
    StopPolling,
    Job(JobCommand),
}

enum JobCommand {
    Upload {
        upload_id: UploadId,
        files: Vec<UploadSource>,
    },
    SubmitExtraction {
        batch_id: BatchId,
        request: ExtractionBatchRequest,
    },
    SubmitAssembly {
        request: AssemblyRequest,
    },
    Poll {
        job_id: String,
    },
    SaveDocument {
        filename: String,
    },
}

/// Owns the worker thread; commands go in, [`EngineEvent`]s come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(config.backend.clone())?);
        Self::with_backend(backend, config)
    }

    pub fn with_backend(
        backend: Arc<dyn JobBackend>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("scribe-engine".to_string())
            .spawn(move || run_worker(runtime, backend, config, cmd_rx, event_tx))?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, upload_id: UploadId, files: Vec<UploadSource>) {
        self.send(EngineCommand::Job(JobCommand::Upload { upload_id, files }));
    }

    pub fn submit_extraction(&self, batch_id: BatchId, request: ExtractionBatchRequest) {
        self.send(EngineCommand::Job(JobCommand::SubmitExtraction {
            batch_id,
            request,
        }));
    }

    pub fn submit_assembly(&self, request: AssemblyRequest) {
        self.send(EngineCommand::Job(JobCommand::SubmitAssembly { request }));
    }

    pub fn start_polling(&self) {
        self.send(EngineCommand::StartPolling);
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn poll(&self, job_id: impl Into<String>) {
        self.send(EngineCommand::Job(JobCommand::Poll {
            job_id: job_id.into(),
        }));
    }

    pub fn save_document(&self, filename: impl Into<String>) {
        self.send(EngineCommand::Job(JobCommand::SaveDocument {
            filename: filename.into(),
        }));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine worker has stopped; command dropped");
        }
    }
}

fn run_worker(
    runtime: tokio::runtime::Runtime,
    backend: Arc<dyn JobBackend>,
    config: EngineConfig,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let writer = Arc::new(OutputWriter::new(config.output_dir));
    let mut timer = PollTimer::new(config.poll_interval);

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::StartPolling => {
                if timer.start(runtime.handle(), event_tx.clone()) {
                    engine_info!("Polling started every {:?}", config.poll_interval);
                }
            }
            EngineCommand::StopPolling => {
                if timer.stop() {
                    engine_info!("Polling stopped");
                }
            }
            EngineCommand::Job(command) => {
                let backend = backend.clone();
                let writer = writer.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = handle_command(backend.as_ref(), &writer, command).await;
                    let _ = event_tx.send(event);
                });
            }
        }
    }

    timer.stop();
    runtime.shutdown_timeout(Duration::from_secs(1));
    engine_debug!("Engine worker exited");
}

async fn handle_command(
    backend: &dyn JobBackend,
    writer: &OutputWriter,
    command: JobCommand,
) -> EngineEvent {
    match command {
        JobCommand::Upload { upload_id, files } => EngineEvent::UploadFinished {
            upload_id,
            result: backend.upload(&files).await,
        },
        JobCommand::SubmitExtraction { batch_id, request } => EngineEvent::ExtractionSubmitted {
            batch_id,
            result: backend.submit_extraction(&request).await,
        },
        JobCommand::SubmitAssembly { request } => EngineEvent::AssemblySubmitted {
            result: backend.submit_assembly(&request).await,
        },
        JobCommand::Poll { job_id } => {
            let result = backend.job_status(&job_id).await;
            EngineEvent::JobPolled { job_id, result }
        }
        JobCommand::SaveDocument { filename } => {
            let result = save_document(backend, writer, &filename).await;
            EngineEvent::DocumentSaved { filename, result }
        }
    }
}

async fn save_document(
    backend: &dyn JobBackend,
    writer: &OutputWriter,
    filename: &str,
) -> Result<PathBuf, SaveError> {
    let bytes = backend.retrieve_document(filename).await?;
    let path = writer.write_document(filename, &bytes)?;
    engine_info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
