use std::backtrace::Backtrace;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::batch::BatchError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(e: E) -> Self {
        Self {
            kind: e.into(),
            backtrace: Backtrace::capture(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("path is a directory, expected a file: {}", .0.display())]
    IsDirectory(PathBuf),
    #[error("target already exists, skipping normalize: {}", .0.display())]
    Conflict(PathBuf),
    #[error("{0} is required but not found in PATH")]
    MissingTool(String),
    #[error("{program} exited with {status}")]
    Subprocess { program: String, status: ExitStatus },
    #[error(
        "created '{}' but failed to remove original '{}': {source}",
        created.display(),
        original.display()
    )]
    RemoveOriginal {
        created: PathBuf,
        original: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Dimensions(String),
    #[error("interrupted")]
    Interrupted,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Batch(#[from] BatchError),
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with a message describing the step that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Context {
                context: context.into(),
                source: Box::new(self),
            },
            backtrace: Backtrace::capture(),
        }
    }

    /// The innermost error kind, looking through any context layers.
    pub fn root_kind(&self) -> &ErrorKind {
        match &self.kind {
            ErrorKind::Context { source, .. } => source.root_kind(),
            kind => kind,
        }
    }

    /// Exit code of a failed child process, if that is what this error is.
    /// An interrupt maps to the shell convention of 128 + SIGINT.
    pub fn exit_code(&self) -> Option<i32> {
        match self.root_kind() {
            ErrorKind::Subprocess { status, .. } => status.code(),
            ErrorKind::Interrupted => Some(130),
            _ => None,
        }
    }
}
