use url::Url;

use crate::filename::validate_document_filename;
use crate::{BackendError, FailureKind};

pub fn upload_url(base: &Url) -> Result<Url, BackendError> {
    join(base, &["upload", ""])
}

pub fn extraction_url(base: &Url) -> Result<Url, BackendError> {
    join(base, &["ocr-multiple-pages", ""])
}

pub fn assembly_url(base: &Url) -> Result<Url, BackendError> {
    join(base, &["generate-book-pdf-async", ""])
}

pub fn status_url(base: &Url, job_id: &str) -> Result<Url, BackendError> {
    if job_id.trim().is_empty() {
        return Err(BackendError::new(FailureKind::InvalidUrl, "empty job id"));
    }
    join(base, &["task-status", job_id])
}

/// `{base}/download-generated-pdf/{filename}` with the filename as one encoded segment.
pub fn document_url(base: &Url, filename: &str) -> Result<Url, BackendError> {
    let filename = validate_document_filename(filename)?;
    join(base, &["download-generated-pdf", filename])
}

fn join(base: &Url, segments: &[&str]) -> Result<Url, BackendError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            BackendError::new(FailureKind::InvalidUrl, format!("{base} cannot be a base url"))
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
