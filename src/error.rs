use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error("dataset not found: {}", .0.to_string_lossy())]
    DatasetNotFound(PathBuf),
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read dataset: {0}")]
    Read(String),
    #[error("failed to write dataset: {0}")]
    Write(String),
    #[error("record {0} not found")]
    RecordOutOfRange(usize),
    #[error("failed to render document: {0}")]
    Render(String),
    #[error("backup bundle error: {0}")]
    Bundle(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LessonError {
    /// Stable code reported to the frontend.
    pub fn code(&self) -> &'static str {
        match self {
            LessonError::DatasetNotFound(_) => "dataset_not_found",
            LessonError::UnsupportedFormat(_) => "unsupported_format",
            LessonError::Read(_) => "dataset_read_failed",
            LessonError::Write(_) => "dataset_write_failed",
            LessonError::RecordOutOfRange(_) => "not_found",
            LessonError::Render(_) => "render_failed",
            LessonError::Bundle(_) => "bundle_failed",
            LessonError::Io(_) => "io_failed",
        }
    }
}

impl From<anyhow::Error> for LessonError {
    fn from(e: anyhow::Error) -> Self {
        LessonError::Bundle(format!("{e:#}"))
    }
}
