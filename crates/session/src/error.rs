use std::fmt;

use rosterkit_io::{ExportError, IngestError};

#[derive(Debug)]
pub enum SessionError {
    /// Configuration rejected before the run started.
    Config(String),
    /// The source file could not be ingested at all.
    Ingest(IngestError),
    /// Detection aborted; fatal to the run. Carries a short message plus an
    /// optional detailed trace for diagnostics.
    Detection { message: String, detail: Option<String> },
    /// Export failed; prior detection results remain valid and
    /// re-exportable.
    Export(ExportError),
    /// The run was cancelled cooperatively.
    Cancelled,
    /// Export or stats requested before a successful run.
    NoResult,
    /// The background worker could not be started.
    Worker(String),
}

impl SessionError {
    /// Human-readable summary plus the optional detailed trace.
    pub fn split(&self) -> (String, Option<String>) {
        match self {
            Self::Detection { message, detail } => (message.clone(), detail.clone()),
            other => (other.to_string(), None),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::Ingest(e) => write!(f, "ingestion failed: {e}"),
            Self::Detection { message, .. } => write!(f, "detection failed: {message}"),
            Self::Export(e) => write!(f, "export failed: {e}"),
            Self::Cancelled => write!(f, "run cancelled"),
            Self::NoResult => write!(f, "no processed data available"),
            Self::Worker(msg) => write!(f, "worker error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<IngestError> for SessionError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

impl From<ExportError> for SessionError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

impl From<rosterkit_dedup::DedupError> for SessionError {
    fn from(e: rosterkit_dedup::DedupError) -> Self {
        Self::Detection {
            message: e.to_string(),
            detail: Some(format!("{e:?}")),
        }
    }
}
