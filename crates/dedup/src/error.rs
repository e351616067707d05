use std::fmt;

#[derive(Debug)]
pub enum DedupError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold range, empty column name, etc.).
    ConfigValidation(String),
    /// An identity column is missing from the dataset header.
    MissingColumn { column: String },
    /// Chunks arrived out of sequence.
    ChunkSequence { expected: usize, got: usize },
    /// Operation not valid in the detector's current state.
    State { operation: &'static str, state: String },
}

impl fmt::Display for DedupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { column } => {
                write!(f, "identity column '{column}' not found in header")
            }
            Self::ChunkSequence { expected, got } => {
                write!(f, "chunk out of sequence: expected {expected}, got {got}")
            }
            Self::State { operation, state } => {
                write!(f, "cannot {operation} in state {state}")
            }
        }
    }
}

impl std::error::Error for DedupError {}
