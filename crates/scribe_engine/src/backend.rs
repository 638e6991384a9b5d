use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::endpoints;
use crate::wire::{
    AssemblyRequest, AssemblyResponse, ErrorBody, ExtractionBatchRequest, ExtractionBatchResponse,
    JobStatus, RemoteJobResult, RemoteState, SubmittedTask, TaskStatusResponse, UploadResponse,
    UploadedFile,
};
use crate::{BackendError, FailureKind};

pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_document_bytes: u64,
}

impl BackendSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// A local image handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    pub original_filename: String,
    pub path: PathBuf,
}

/// The remote job service: uploads, submissions, status queries, downloads.
#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    async fn upload(&self, files: &[UploadSource]) -> Result<Vec<UploadedFile>, BackendError>;

    async fn submit_extraction(
        &self,
        request: &ExtractionBatchRequest,
    ) -> Result<Vec<SubmittedTask>, BackendError>;

    async fn submit_assembly(&self, request: &AssemblyRequest) -> Result<String, BackendError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, BackendError>;

    async fn retrieve_document(&self, filename: &str) -> Result<Vec<u8>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl JobBackend for ReqwestBackend {
    async fn upload(&self, files: &[UploadSource]) -> Result<Vec<UploadedFile>, BackendError> {
        let url = endpoints::upload_url(&self.settings.base_url)?;
        let mut form = Form::new();
        for file in files {
            let bytes = tokio::fs::read(&file.path).await.map_err(|err| {
                BackendError::new(
                    FailureKind::LocalFile,
                    format!("{}: {err}", file.path.display()),
                )
            })?;
            let part = Part::bytes(bytes)
                .file_name(file.original_filename.clone())
                .mime_str(image_mime(&file.original_filename))
                .map_err(|err| BackendError::new(FailureKind::LocalFile, err.to_string()))?;
            form = form.part("files", part);
        }

        engine_logging::engine_debug!("Uploading {} file(s) to {url}", files.len());
        let response: UploadResponse = self.send_json(self.client.post(url).multipart(form)).await?;
        Ok(response.uploaded_files)
    }

    async fn submit_extraction(
        &self,
        request: &ExtractionBatchRequest,
    ) -> Result<Vec<SubmittedTask>, BackendError> {
        let url = endpoints::extraction_url(&self.settings.base_url)?;
        let response: ExtractionBatchResponse =
            self.send_json(self.client.post(url).json(request)).await?;
        if let Some(message) = response.message.as_deref() {
            engine_logging::engine_debug!("Extraction batch accepted: {message}");
        }
        Ok(response.submitted_tasks)
    }

    async fn submit_assembly(&self, request: &AssemblyRequest) -> Result<String, BackendError> {
        let url = endpoints::assembly_url(&self.settings.base_url)?;
        let response: AssemblyResponse =
            self.send_json(self.client.post(url).json(request)).await?;
        if response.task_id.trim().is_empty() {
            return Err(BackendError::new(
                FailureKind::Decode,
                "assembly response carried an empty task id",
            ));
        }
        Ok(response.task_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, BackendError> {
        let url = endpoints::status_url(&self.settings.base_url, job_id)?;
        let response: TaskStatusResponse = self.send_json(self.client.get(url)).await?;
        decode_status(response)
    }

    async fn retrieve_document(&self, filename: &str) -> Result<Vec<u8>, BackendError> {
        let url = endpoints::document_url(&self.settings.base_url, filename)?;
        let max_bytes = self.settings.max_document_bytes;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "document too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "document too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

pub(crate) fn decode_status(response: TaskStatusResponse) -> Result<JobStatus, BackendError> {
    let succeeded = match response.state() {
        RemoteState::Pending => return Ok(JobStatus::Pending),
        RemoteState::Succeeded => true,
        RemoteState::Failed => false,
    };
    let result = decode_result(response.result)?;
    Ok(JobStatus::Finished { succeeded, result })
}

/// A missing result reads as empty; a bare string or other scalar is taken as the error.
fn decode_result(value: Option<Value>) -> Result<RemoteJobResult, BackendError> {
    match value {
        None | Some(Value::Null) => Ok(RemoteJobResult::default()),
        Some(Value::String(error)) => Ok(RemoteJobResult::from_error(error)),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string())),
        Some(other) => Ok(RemoteJobResult::from_error(other.to_string())),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .bytes()
        .await
        .ok()
        .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
        .and_then(ErrorBody::detail_text);
    let message = match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => status.to_string(),
    };
    Err(BackendError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

fn image_mime(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(status: &str, result: Option<serde_json::Value>) -> TaskStatusResponse {
        TaskStatusResponse {
            task_id: Some("j1".to_string()),
            status: status.to_string(),
            result,
        }
    }

    #[test]
    fn started_job_is_pending() {
        assert_eq!(decode_status(status("STARTED", None)).unwrap(), JobStatus::Pending);
    }

    #[test]
    fn terminal_without_result_finishes_empty() {
        assert_eq!(
            decode_status(status("SUCCESS", None)).unwrap(),
            JobStatus::Finished {
                succeeded: true,
                result: RemoteJobResult::default(),
            }
        );
    }

    #[test]
    fn crashed_job_keeps_its_error() {
        let decoded = decode_status(status("FAILURE", Some(json!({ "error": "render timeout" }))))
            .unwrap();
        match decoded {
            JobStatus::Finished {
                succeeded: false,
                result,
            } => assert_eq!(result.error.as_deref(), Some("render timeout")),
            other => panic!("unexpected status {other:?}"),
        }

        let decoded = decode_status(status("FAILURE", Some(json!("worker lost")))).unwrap();
        assert_eq!(
            decoded,
            JobStatus::Finished {
                succeeded: false,
                result: RemoteJobResult::from_error("worker lost"),
            }
        );
    }

    #[test]
    fn mistyped_result_is_a_decode_error() {
        let err = decode_status(status("SUCCESS", Some(json!({ "text": 42 })))).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime("A.JPG"), "image/jpeg");
        assert_eq!(image_mime("scan.tiff"), "image/tiff");
        assert_eq!(image_mime("notes"), "application/octet-stream");
    }
}
