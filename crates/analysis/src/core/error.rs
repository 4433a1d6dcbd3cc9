use thiserror::Error;

/// Fatal pipeline failures. Everything below this level is file-scoped
/// degradation recorded in run metadata, never an abort.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to enumerate repository files: {0}")]
    Selection(String),

    #[error("no files could be selected under {0}")]
    NoFilesSelected(String),
}
