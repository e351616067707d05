// Safe ingestion: converts an arbitrary source file into a materialized,
// append-only row stream, choosing a strategy by estimated size. Never holds
// the whole dataset in memory for large inputs and never lets a failed
// conversion batch crash the caller.

use std::path::Path;

use log::{error, info, warn};
use rosterkit_core::{CancelToken, ProgressSink, Record, Table, INDETERMINATE};

use crate::delimited::{self, DelimitedBatches};
use crate::error::IngestError;
use crate::stream::MaterializedStream;
use crate::workbook::WorkbookBatches;
use crate::{SMALL_FILE_BYTES, SMALL_FILE_ROWS};

/// Rows retained for the preview table in streamed mode.
const PREVIEW_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Delimited,
    Workbook,
}

fn detect_format(path: &Path) -> Result<SourceFormat, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
        "xlsx" | "xls" | "xlsb" | "ods" => Ok(SourceFormat::Workbook),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// Size-based row estimate used when native estimation is unavailable.
fn heuristic_rows(file_size: u64) -> usize {
    ((file_size / 100) as usize).max(500)
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one ingestion. Small inputs come back fully materialized with
/// no stream; large inputs get a preview plus the materialized stream the
/// chunk reader will iterate.
#[derive(Debug)]
pub struct IngestOutcome {
    pub preview: Table,
    pub stream: Option<MaterializedStream>,
    pub row_estimate: usize,
}

impl IngestOutcome {
    pub fn is_chunked(&self) -> bool {
        self.stream.is_some()
    }
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

pub struct SafeIngestor {
    chunk_size: usize,
    small_file_bytes: u64,
    small_file_rows: usize,
    cancel: CancelToken,
}

impl SafeIngestor {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            small_file_bytes: SMALL_FILE_BYTES,
            small_file_rows: SMALL_FILE_ROWS,
            cancel: CancelToken::new(),
        }
    }

    /// Install a cancellation token. Pending conversion batches are skipped
    /// once it fires; the batch in progress completes.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    fn with_thresholds(mut self, bytes: u64, rows: usize) -> Self {
        self.small_file_bytes = bytes;
        self.small_file_rows = rows;
        self
    }

    /// Ingest a source file, auto-detecting the format by extension.
    ///
    /// A failed conversion batch is logged and conversion stops at the last
    /// successfully written row; the partial stream and achieved row count
    /// are returned rather than an error.
    pub fn ingest(
        &self,
        path: &Path,
        progress: &mut ProgressSink<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        let format = detect_format(path)?;
        let file_size = std::fs::metadata(path)
            .map_err(|e| IngestError::Open(e.to_string()))?
            .len();

        info!("ingesting {} ({file_size} bytes)", path.display());
        progress(0, "Analyzing input...");

        match format {
            SourceFormat::Delimited => self.ingest_delimited(path, file_size, progress),
            SourceFormat::Workbook => self.ingest_workbook(path, file_size, progress),
        }
    }

    fn ingest_delimited(
        &self,
        path: &Path,
        file_size: u64,
        progress: &mut ProgressSink<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        // Direct load attempt for small files; a failure here is logged and
        // ingestion falls through to the batched converter.
        if file_size < self.small_file_bytes {
            match delimited::read_table(path) {
                Ok(table) if table.len() < self.small_file_rows => {
                    let rows = table.len();
                    progress(100, "Load complete");
                    return Ok(IngestOutcome {
                        preview: table,
                        stream: None,
                        row_estimate: rows,
                    });
                }
                Ok(table) => {
                    // Row threshold exceeded; fall through with an exact count.
                    let estimate = table.len();
                    drop(table);
                    let source = DelimitedBatches::open(path)?;
                    return self.convert(source, Some(estimate), progress);
                }
                Err(e) => warn!("direct load failed, falling back to conversion: {e}"),
            }
        }

        let estimate = heuristic_rows(file_size);
        let source = DelimitedBatches::open(path)?;
        self.convert(source, Some(estimate), progress)
    }

    fn ingest_workbook(
        &self,
        path: &Path,
        file_size: u64,
        progress: &mut ProgressSink<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        // The sheet's native dimensions give the row estimate; if the sheet
        // cannot be decoded at all there is nothing to convert either.
        let mut source = WorkbookBatches::open(path)?;
        let estimate = source.total_rows();
        info!("workbook estimated {estimate} data rows");

        if file_size < self.small_file_bytes && estimate < self.small_file_rows {
            let mut table = Table::new(source.header().to_vec());
            loop {
                let batch = source.next_batch(self.chunk_size)?;
                if batch.is_empty() {
                    break;
                }
                for values in batch {
                    let origin = table.len();
                    table.rows.push(Record::new(origin, values));
                }
            }
            let rows = table.len();
            progress(100, "Load complete");
            return Ok(IngestOutcome {
                preview: table,
                stream: None,
                row_estimate: rows,
            });
        }

        self.convert(source, Some(estimate), progress)
    }

    /// Batched conversion to the materialized stream: header on the first
    /// batch only, append thereafter, stop on an empty batch. Peak memory is
    /// bounded by one batch.
    fn convert(
        &self,
        mut source: impl BatchSource,
        estimate: Option<usize>,
        progress: &mut ProgressSink<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        progress(INDETERMINATE, "Starting conversion...");

        let mut stream = MaterializedStream::create(source.header())?;
        let mut preview = Table::new(source.header().to_vec());
        let mut written = 0usize;
        let mut last_pct = 0i32;

        loop {
            if self.cancel.is_cancelled() {
                info!("conversion cancelled after {written} rows");
                break;
            }

            let batch = match source.next_batch(self.chunk_size) {
                Ok(batch) => batch,
                Err(e) => {
                    // Degrade gracefully: keep whatever was written so far.
                    error!("conversion batch failed after {written} rows: {e}");
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }

            let room = PREVIEW_ROWS.saturating_sub(preview.len());
            for values in batch.iter().take(room) {
                let origin = preview.len();
                preview.rows.push(Record::new(origin, values.clone()));
            }

            if let Err(e) = stream.append_batch(&batch) {
                error!("failed to append batch after {written} rows: {e}");
                break;
            }
            written += batch.len();

            match estimate {
                Some(est) if est > 0 => {
                    let pct = (((written as u64 * 99) / est as u64) as i32).min(99);
                    last_pct = last_pct.max(pct);
                    progress(last_pct, &format!("Converting... {written} rows"));
                }
                _ => progress(INDETERMINATE, &format!("Converting... {written} rows")),
            }
        }

        stream.seal();
        progress(100, "Conversion complete");
        info!("conversion wrote {written} rows to {}", stream.path().display());

        Ok(IngestOutcome {
            preview,
            stream: Some(stream),
            row_estimate: written,
        })
    }
}

trait BatchSource {
    fn header(&self) -> &[String];
    fn next_batch(&mut self, n: usize) -> Result<Vec<Vec<String>>, IngestError>;
}

impl BatchSource for DelimitedBatches {
    fn header(&self) -> &[String] {
        DelimitedBatches::header(self)
    }
    fn next_batch(&mut self, n: usize) -> Result<Vec<Vec<String>>, IngestError> {
        DelimitedBatches::next_batch(self, n)
    }
}

impl BatchSource for WorkbookBatches {
    fn header(&self) -> &[String] {
        WorkbookBatches::header(self)
    }
    fn next_batch(&mut self, n: usize) -> Result<Vec<Vec<String>>, IngestError> {
        WorkbookBatches::next_batch(self, n)
    }
}
