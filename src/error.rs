use crate::process::ProcessId;

/// Errors surfaced by the simulator core and its file I/O
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("process {0:?} not found")]
    NotFound(String),

    #[error("no process with id {0}")]
    UnknownProcess(ProcessId),

    #[error("invalid address {0}: addresses must be non-negative")]
    InvalidAddress(i64),

    #[error("page {page} out of range for process {pid} ({page_count} pages)")]
    PageOutOfRange {
        pid: ProcessId,
        page: usize,
        page_count: usize,
    },

    #[error("no usable frame available")]
    NoFrameAvailable,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
