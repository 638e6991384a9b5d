use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info};
use scribe_core::Transcript;
use scribe_engine::{ensure_output_dir, transcript_filename, OutputWriter};

/// Writes one text file per transcript; failures are logged and skipped.
pub(crate) fn write_transcripts(output_dir: &Path, transcripts: &[Transcript]) -> Vec<PathBuf> {
    if transcripts.is_empty() {
        return Vec::new();
    }
    if let Err(err) = ensure_output_dir(output_dir) {
        engine_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return Vec::new();
    }

    let writer = OutputWriter::new(output_dir);
    let mut written = Vec::with_capacity(transcripts.len());
    for transcript in transcripts {
        let filename = transcript_filename(&transcript.original_filename, &transcript.server_handle);
        match writer.write_transcript(&filename, &transcript.text) {
            Ok(path) => written.push(path),
            Err(err) => engine_error!(
                "Failed to write transcript for {}: {}",
                transcript.original_filename,
                err
            ),
        }
    }
    engine_info!("Wrote {} transcript(s) to {:?}", written.len(), output_dir);
    written
}
