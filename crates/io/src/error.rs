use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    /// File extension is not a supported input format.
    UnsupportedFormat(String),
    /// The source file could not be opened or read at all.
    Open(String),
    /// The materialized stream could not be created or written.
    Stream(String),
    /// A chunk read from the materialized stream failed.
    ChunkRead(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(ext) => write!(f, "unsupported input format: '{ext}'"),
            Self::Open(msg) => write!(f, "cannot open source file: {msg}"),
            Self::Stream(msg) => write!(f, "materialized stream error: {msg}"),
            Self::ChunkRead(msg) => write!(f, "chunk read error: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Debug)]
pub enum ExportError {
    /// Destination extension maps to no supported output format.
    UnsupportedFormat(String),
    /// Write failure (CSV or workbook).
    Write(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(ext) => write!(f, "unsupported export format: '{ext}'"),
            Self::Write(msg) => write!(f, "export write error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}
