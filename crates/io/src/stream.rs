// The materialized row stream: an append-only UTF-8 CSV artifact produced by
// ingestion and consumed by the chunk reader.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::IngestError;

/// Exclusively-owned append-only CSV artifact. The header is written once at
/// creation; data batches are appended until conversion ends.
///
/// There is deliberately no `Drop` cleanup: the stream must stay valid while
/// a `ChunkReader` still iterates it, so the file is removed only by an
/// explicit [`release`](Self::release) from the owning session.
#[derive(Debug)]
pub struct MaterializedStream {
    path: PathBuf,
    header: Vec<String>,
    rows_written: usize,
    writer: Option<csv::Writer<BufWriter<File>>>,
}

impl MaterializedStream {
    /// Create the artifact in the temp directory and write the header row.
    pub fn create(header: &[String]) -> Result<Self, IngestError> {
        let path = std::env::temp_dir().join(format!("rosterkit-{}.csv", uuid::Uuid::new_v4()));
        let file = File::create(&path).map_err(|e| IngestError::Stream(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        writer
            .write_record(header)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| IngestError::Stream(e.to_string()))?;

        info!("materialized stream created at {}", path.display());
        Ok(Self {
            path,
            header: header.to_vec(),
            rows_written: 0,
            writer: Some(writer),
        })
    }

    /// Append one batch of rows. Each batch is flushed so the artifact is
    /// readable up to the last completed batch even if a later one fails.
    pub fn append_batch(&mut self, rows: &[Vec<String>]) -> Result<(), IngestError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| IngestError::Stream("stream is sealed".into()))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| IngestError::Stream(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| IngestError::Stream(e.to_string()))?;
        self.rows_written += rows.len();
        Ok(())
    }

    /// Close the writer; the artifact becomes read-only for chunk iteration.
    pub fn seal(&mut self) {
        self.writer = None;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Delete the artifact. Consumes the stream: the owning session calls
    /// this on every exit path once no reader needs the file anymore.
    pub fn release(mut self) {
        self.writer = None;
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("failed to remove materialized stream {}: {e}", self.path.display());
        } else {
            info!("released materialized stream {}", self.path.display());
        }
    }

}
