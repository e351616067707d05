// Chunk reading: a lazy, finite, single-pass sequence of bounded record
// batches over either a materialized stream or an in-memory table.

use std::fs::File;
use std::path::Path;
use std::vec;

use rosterkit_core::{Chunk, Record, Table};

use crate::error::IngestError;
use crate::stream::MaterializedStream;

enum Source {
    /// Already fully materialized (small inputs).
    Direct(vec::IntoIter<Record>),
    /// Streamed from the materialized CSV artifact.
    Streamed { reader: csv::Reader<File>, next_origin: usize },
}

/// Iterator of [`Chunk`]s of a configured size, with monotonically
/// increasing sequence numbers. Single pass; a read error ends iteration
/// after yielding it.
pub struct ChunkReader {
    source: Source,
    header: Vec<String>,
    chunk_size: usize,
    total_rows: usize,
    next_seq: usize,
    done: bool,
}

impl ChunkReader {
    /// Direct mode over an in-memory table.
    pub fn from_table(table: Table, chunk_size: usize) -> Self {
        let total_rows = table.len();
        Self {
            header: table.header,
            source: Source::Direct(table.rows.into_iter()),
            chunk_size: chunk_size.max(1),
            total_rows,
            next_seq: 0,
            done: false,
        }
    }

    /// Chunked mode over a materialized stream. The stream must outlive the
    /// reader; the caller keeps ownership and releases it afterwards.
    pub fn from_stream(stream: &MaterializedStream, chunk_size: usize) -> Result<Self, IngestError> {
        Self::from_path(stream.path(), stream.header().to_vec(), stream.rows_written(), chunk_size)
    }

    fn from_path(
        path: &Path,
        header: Vec<String>,
        total_rows: usize,
        chunk_size: usize,
    ) -> Result<Self, IngestError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::ChunkRead(e.to_string()))?;
        Ok(Self {
            source: Source::Streamed { reader, next_origin: 0 },
            header,
            chunk_size: chunk_size.max(1),
            total_rows,
            next_seq: 0,
            done: false,
        })
    }

    /// True when the dataset is streamed rather than fully materialized.
    pub fn is_chunked(&self) -> bool {
        matches!(self.source, Source::Streamed { .. })
    }

    /// Best-known total data row count. Exact in direct mode; in chunked
    /// mode it is whatever the conversion achieved, which may undercount a
    /// source that failed part-way.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn next_batch(&mut self) -> Result<Vec<Record>, IngestError> {
        match &mut self.source {
            Source::Direct(rows) => Ok(rows.take(self.chunk_size).collect()),
            Source::Streamed { reader, next_origin } => {
                let mut records = Vec::new();
                let mut raw = csv::StringRecord::new();
                while records.len() < self.chunk_size {
                    let more = reader
                        .read_record(&mut raw)
                        .map_err(|e| IngestError::ChunkRead(e.to_string()))?;
                    if !more {
                        break;
                    }
                    records.push(Record::new(
                        *next_origin,
                        raw.iter().map(str::to_string).collect(),
                    ));
                    *next_origin += 1;
                }
                Ok(records)
            }
        }
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Chunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_batch() {
            Ok(records) if records.is_empty() => {
                self.done = true;
                None
            }
            Ok(records) => {
                let chunk = Chunk::new(self.next_seq, records);
                self.next_seq += 1;
                Some(Ok(chunk))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> Table {
        let mut t = Table::new(vec!["Name".into(), "DOB".into()]);
        for i in 0..rows {
            t.rows.push(Record::new(
                i,
                vec![format!("Student {i}"), "2010-01-01".into()],
            ));
        }
        t
    }

    #[test]
    fn direct_mode_chunks_in_order() {
        let reader = ChunkReader::from_table(table(5), 2);
        assert!(!reader.is_chunked());
        assert_eq!(reader.total_rows(), 5);

        let chunks: Vec<Chunk> = reader.map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].seq, 0);
        assert_eq!(chunks[2].seq, 2);
        assert_eq!(chunks[2].len(), 1);
        assert_eq!(chunks[2].records[0].origin, 4);
    }

    #[test]
    fn streamed_mode_round_trips_the_artifact() {
        let header = vec!["Name".to_string(), "DOB".to_string()];
        let mut stream = MaterializedStream::create(&header).unwrap();
        let rows: Vec<Vec<String>> = (0..5)
            .map(|i| vec![format!("Student {i}"), "2010-01-01".to_string()])
            .collect();
        stream.append_batch(&rows).unwrap();
        stream.seal();

        let reader = ChunkReader::from_stream(&stream, 2).unwrap();
        assert!(reader.is_chunked());
        assert_eq!(reader.total_rows(), 5);

        let chunks: Vec<Chunk> = reader.map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].records[0].origin, 2);
        assert_eq!(chunks[1].records[0].value(0), "Student 2");

        stream.release();
    }

    #[test]
    fn empty_table_yields_no_chunks() {
        let mut reader = ChunkReader::from_table(table(0), 10);
        assert!(reader.next().is_none());
    }
}
