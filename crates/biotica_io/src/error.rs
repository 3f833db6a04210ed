//! Typed load/save failures. A failed load never partially mutates a
//! kernel: records are fully restored and validated before anything is
//! handed to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    /// The container or its contents could not be decoded, or decoded into
    /// an inconsistent state.
    #[error("corrupt save payload: {0}")]
    CorruptPayload(String),

    /// The save was written by a newer schema than this build understands.
    #[error("save schema {found} is newer than supported {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// The save predates the oldest schema this build can migrate.
    #[error("save schema {found} is no longer supported (minimum {minimum})")]
    SchemaUnsupported { found: u32, minimum: u32 },

    /// Underlying storage failure.
    #[error("save I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    #[must_use]
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::CorruptPayload(msg.into())
    }

    /// Exit code for the CLI surface: 3 for corrupt saves, 4 for storage.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 4,
            _ => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
