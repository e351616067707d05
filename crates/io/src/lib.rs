// File I/O operations

pub mod chunks;
pub mod delimited;
pub mod error;
pub mod export;
pub mod ingest;
pub mod stream;
pub mod workbook;

pub use chunks::ChunkReader;
pub use error::{ExportError, IngestError};
pub use ingest::{IngestOutcome, SafeIngestor};
pub use stream::MaterializedStream;

/// Small-input thresholds: below both, ingestion returns the table directly
/// with no materialized stream.
pub const SMALL_FILE_BYTES: u64 = 1_000_000;
pub const SMALL_FILE_ROWS: usize = 5_000;
