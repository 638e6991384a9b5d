//! The output directory, where downloaded documents and page transcripts land.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {} is unusable: {source}", .dir.display())]
    OutputDir { dir: PathBuf, source: io::Error },
    #[error("output path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("refusing to write {0:?}: not a plain file name")]
    UnsafeName(String),
    #[error("failed to write {} {}: {source}", .artifact, .path.display())]
    Write {
        artifact: Artifact,
        path: PathBuf,
        source: io::Error,
    },
}

/// What is being written; only used for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Document,
    Transcript,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Artifact::Document => "document",
            Artifact::Transcript => "transcript",
        })
    }
}

/// Creates `dir` if missing and checks that a file can be created inside it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |source| PersistError::OutputDir {
        dir: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(unusable)?;
        }
        Err(err) => return Err(unusable(err)),
    }
    NamedTempFile::new_in(dir).map_err(unusable)?;
    Ok(())
}

/// Writes into one output directory. Each file is staged next to its target
/// and renamed over it, so a reader never sees a partial document.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_document(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        self.write(Artifact::Document, filename, bytes)
    }

    pub fn write_transcript(&self, filename: &str, text: &str) -> Result<PathBuf, PersistError> {
        self.write(Artifact::Transcript, filename, text.as_bytes())
    }

    fn write(
        &self,
        artifact: Artifact,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, PersistError> {
        if !is_plain_file_name(filename) {
            return Err(PersistError::UnsafeName(filename.to_string()));
        }
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let failed = |source| PersistError::Write {
            artifact,
            path: target.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(failed)?;
        staged.write_all(content).map_err(failed)?;
        staged.as_file_mut().sync_all().map_err(failed)?;
        staged.persist(&target).map_err(|err| failed(err.error))?;
        Ok(target)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|file| file.to_str()) == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bare_names_are_plain() {
        assert!(is_plain_file_name("merged_book_a1.pdf"));
        assert!(is_plain_file_name("page--1a2b3c4d.txt"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../book.pdf"));
        assert!(!is_plain_file_name("sub\\book.pdf"));
    }
}
