use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use log::info;
use rosterkit_classify::{FieldClassifier, FieldMapping};
use rosterkit_core::{CancelToken, ProgressSink, Table, INDETERMINATE};
use rosterkit_dedup::{DedupeStats, DuplicateDetector};
use rosterkit_io::export::export_table;
use rosterkit_io::{ChunkReader, MaterializedStream, SafeIngestor};
use serde::Serialize;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::SessionEvent;

// ---------------------------------------------------------------------------
// Result + stats
// ---------------------------------------------------------------------------

/// Everything a completed run produced: the effective header (canonicalized
/// when classification ran), the field mapping, and the two partitions.
#[derive(Debug)]
pub struct CleaningResult {
    pub header: Vec<String>,
    pub mapping: Option<FieldMapping>,
    pub clean: Table,
    pub duplicate: Table,
    pub stats: DedupeStats,
}

/// Stats record retained by the session for the reporting collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub total: usize,
    pub clean: usize,
    pub duplicate: usize,
    pub duplicate_percentage: f64,
    pub started_at: String,
    pub finished_at: String,
    pub exported_at: Option<String>,
    pub clean_path: Option<String>,
    pub duplicate_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One cleaning session: ingest → classify → detect, with explicit ownership
/// of the materialized stream. Construct one per dataset; there is no shared
/// process-wide state.
///
/// The stream artifact is released on every exit path (a new load, an error
/// or cancellation during `run`, an explicit `clear`) and never from a
/// destructor.
pub struct CleaningSession {
    config: SessionConfig,
    cancel: CancelToken,
    stream: Option<MaterializedStream>,
    result: Option<CleaningResult>,
    stats: Option<RunStats>,
}

impl CleaningSession {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
            stream: None,
            result: None,
            stats: None,
        })
    }

    /// Token shared with the caller for cooperative cancellation.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Path of the current materialized stream artifact, if any.
    pub fn materialized_path(&self) -> Option<&Path> {
        self.stream.as_ref().map(|s| s.path())
    }

    pub fn result(&self) -> Option<&CleaningResult> {
        self.result.as_ref()
    }

    /// Move the result out (used by the detached worker to ship it).
    pub fn take_result(&mut self) -> Option<CleaningResult> {
        self.result.take()
    }

    pub fn stats(&self) -> Option<&RunStats> {
        self.stats.as_ref()
    }

    /// Run the full pipeline over one source file. On error or cancellation
    /// the stream artifact is released before returning; on success it is
    /// retained until `clear` or the next `run`.
    pub fn run(
        &mut self,
        path: &Path,
        progress: &mut ProgressSink<'_>,
    ) -> Result<&CleaningResult, SessionError> {
        match self.run_inner(path, progress) {
            Ok(result) => {
                self.result = Some(result);
                Ok(self.result.as_ref().expect("result just stored"))
            }
            Err(e) => {
                self.release_stream();
                Err(e)
            }
        }
    }

    fn run_inner(
        &mut self,
        path: &Path,
        progress: &mut ProgressSink<'_>,
    ) -> Result<CleaningResult, SessionError> {
        let started_at = chrono::Utc::now().to_rfc3339();

        // A new load operation releases the previous stream's artifact.
        self.release_stream();
        self.result = None;
        self.stats = None;

        let ingestor =
            SafeIngestor::new(self.config.dedupe.chunk_size).with_cancel(self.cancel.clone());
        let outcome = ingestor.ingest(path, progress)?;
        self.stream = outcome.stream;
        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let preview = outcome.preview;
        let (header, mapping) = if self.config.auto_classify {
            let mapping = FieldClassifier::new().classify(&preview);
            (mapping.rename_header(&preview.header), Some(mapping))
        } else {
            (preview.header.clone(), None)
        };

        let mut detector = DuplicateDetector::new(self.config.dedupe.clone(), &header)?;

        progress(0, "Detecting duplicates...");
        let reader = match &self.stream {
            Some(stream) => ChunkReader::from_stream(stream, self.config.dedupe.chunk_size)
                .map_err(|e| SessionError::Detection {
                    message: "cannot open materialized stream".into(),
                    detail: Some(e.to_string()),
                })?,
            None => ChunkReader::from_table(preview, self.config.dedupe.chunk_size),
        };

        let total = reader.total_rows();
        let mut processed = 0usize;
        let mut last_pct = 0i32;
        for chunk in reader {
            // Pending chunks are skipped on cancellation; the one in
            // progress below runs to completion.
            if self.cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            let chunk = chunk.map_err(|e| SessionError::Detection {
                message: "chunk read failed".into(),
                detail: Some(e.to_string()),
            })?;
            processed += chunk.len();
            detector.process_chunk(chunk)?;

            if total > 0 {
                let pct = (((processed as u64 * 99) / total as u64) as i32).min(99);
                last_pct = last_pct.max(pct);
                progress(last_pct, &format!("Processed {processed} of {total} rows"));
            } else {
                progress(INDETERMINATE, &format!("Processed {processed} rows"));
            }
        }
        let outcome = detector.finish()?;
        progress(100, "Processing complete");

        let finished_at = chrono::Utc::now().to_rfc3339();
        self.stats = Some(RunStats {
            total: outcome.stats.total,
            clean: outcome.stats.clean,
            duplicate: outcome.stats.duplicate,
            duplicate_percentage: outcome.stats.duplicate_percentage,
            started_at,
            finished_at,
            exported_at: None,
            clean_path: None,
            duplicate_path: None,
        });

        info!(
            "session run complete: {} total, {} duplicate",
            outcome.stats.total, outcome.stats.duplicate
        );

        Ok(CleaningResult {
            clean: Table { header: header.clone(), rows: outcome.clean },
            duplicate: Table { header: header.clone(), rows: outcome.duplicate },
            header,
            mapping,
            stats: outcome.stats,
        })
    }

    /// Export both partitions; the format is inferred from each destination
    /// extension. A failed export leaves the detection result intact and
    /// re-exportable.
    pub fn export(
        &mut self,
        clean_path: &Path,
        duplicate_path: &Path,
    ) -> Result<(), SessionError> {
        let result = self.result.as_ref().ok_or(SessionError::NoResult)?;
        export_table(&result.clean, clean_path)?;
        export_table(&result.duplicate, duplicate_path)?;

        if let Some(stats) = self.stats.as_mut() {
            stats.exported_at = Some(chrono::Utc::now().to_rfc3339());
            stats.clean_path = Some(clean_path.display().to_string());
            stats.duplicate_path = Some(duplicate_path.display().to_string());
        }
        Ok(())
    }

    /// Reset all session state and release the stream artifact.
    pub fn clear(&mut self) {
        info!("clearing session state");
        self.release_stream();
        self.result = None;
        self.stats = None;
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.release();
        }
    }
}

// ---------------------------------------------------------------------------
// Detached worker
// ---------------------------------------------------------------------------

/// Handle to a session running on its own worker thread.
pub struct SessionHandle {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl SessionHandle {
    /// Request cooperative cancellation; in-flight work completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to finish. Events arrive on the channel either
    /// way; joining is only for deterministic teardown.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Run a whole session on a background thread. The caller's thread is never
/// blocked; it receives [`SessionEvent`]s on `events`. The worker clears the
/// session (releasing the stream artifact) on every exit path.
pub fn spawn_session(
    config: SessionConfig,
    path: PathBuf,
    events: Sender<SessionEvent>,
) -> Result<SessionHandle, SessionError> {
    let mut session = CleaningSession::new(config)?;
    let cancel = session.cancel_token();

    let handle = thread::Builder::new()
        .name("cleaning-session".into())
        .spawn(move || {
            let mut progress = |percent: i32, message: &str| {
                let _ = events.send(SessionEvent::Progress {
                    percent,
                    message: message.to_string(),
                });
            };

            if let Err(e) = session.run(&path, &mut progress) {
                let (message, detail) = e.split();
                let _ = events.send(SessionEvent::Failed { message, detail });
            } else if let (Some(result), Some(stats)) =
                (session.take_result(), session.stats().cloned())
            {
                let _ = events.send(SessionEvent::Completed { result, stats });
            }

            session.clear();
        })
        .map_err(|e| SessionError::Worker(e.to_string()))?;

    Ok(SessionHandle { cancel, handle })
}
