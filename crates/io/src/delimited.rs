// Delimited text input: delimiter sniffing, encoding fallback, direct and
// batched reading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rosterkit_core::{Record, Table};

use crate::error::IngestError;

/// Bytes read from the head of a file for delimiter sniffing.
const SNIFF_BYTES: usize = 64 * 1024;

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The delimiter that produces the most consistent field count (>1 field)
/// wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        // Higher field count breaks ties — more columns = more likely real delimiter
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Sniff the delimiter from the head of a file without loading all of it.
pub fn sniff_file_delimiter(path: &Path) -> Result<u8, IngestError> {
    let mut file = File::open(path).map_err(|e| IngestError::Open(e.to_string()))?;
    let mut buf = vec![0u8; SNIFF_BYTES];
    let n = file.read(&mut buf).map_err(|e| IngestError::Open(e.to_string()))?;
    buf.truncate(n);
    Ok(sniff_delimiter(&decode_bytes(&buf)))
}

/// Decode bytes as UTF-8, falling back to Windows-1252 (common for
/// Excel-exported CSVs).
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn decode_record(record: &csv::ByteRecord) -> Vec<String> {
    record.iter().map(decode_bytes).collect()
}

// ---------------------------------------------------------------------------
// Direct read
// ---------------------------------------------------------------------------

/// Fully materialize a delimited file: first row is the header, remaining
/// rows become records with their file-order origin index.
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    let delimiter = sniff_file_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| IngestError::Open(e.to_string()))?;

    let mut table = Table::default();
    let mut origin = 0usize;
    for result in reader.byte_records() {
        let record = result.map_err(|e| IngestError::Open(e.to_string()))?;
        let values = decode_record(&record);
        if table.header.is_empty() {
            table.header = values;
        } else {
            table.rows.push(Record::new(origin, values));
            origin += 1;
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Batched read
// ---------------------------------------------------------------------------

/// Streaming batch reader over a delimited file. Reads the header eagerly;
/// each `next_batch` call yields up to `n` data rows. Memory is bounded by
/// one batch regardless of file size.
pub struct DelimitedBatches {
    reader: csv::Reader<File>,
    header: Vec<String>,
}

impl DelimitedBatches {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let delimiter = sniff_file_delimiter(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::Open(e.to_string()))?;

        let mut first = csv::ByteRecord::new();
        let has_header = reader
            .read_byte_record(&mut first)
            .map_err(|e| IngestError::Open(e.to_string()))?;
        if !has_header {
            return Err(IngestError::Open("file has no header row".into()));
        }

        Ok(Self {
            reader,
            header: decode_record(&first),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Next batch of up to `n` rows; an empty batch signals the end.
    pub fn next_batch(&mut self, n: usize) -> Result<Vec<Vec<String>>, IngestError> {
        let mut rows = Vec::with_capacity(n.min(1024));
        let mut record = csv::ByteRecord::new();
        while rows.len() < n {
            let more = self
                .reader
                .read_byte_record(&mut record)
                .map_err(|e| IngestError::ChunkRead(e.to_string()))?;
            if !more {
                break;
            }
            rows.push(decode_record(&record));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn sniff_common_delimiters() {
        assert_eq!(sniff_delimiter("Name,Age\nAlice,30\n"), b',');
        assert_eq!(sniff_delimiter("Name;Age\nAlice;30\n"), b';');
        assert_eq!(sniff_delimiter("Name\tAge\nAlice\t30\n"), b'\t');
        assert_eq!(sniff_delimiter("Name|Age\nAlice|30\n"), b'|');
    }

    #[test]
    fn sniff_semicolon_with_commas_in_values() {
        let content =
            "Name;Address\n\"Doe, Jane\";\"123 Main St, Apt 4\"\nBob;\"456 Elm\"\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn read_table_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "Name,DOB\nAlice Smith,2010-01-01\nBob Jones,2011-02-02\n")
            .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.header, vec!["Name", "DOB"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].origin, 0);
        assert_eq!(table.rows[1].value(0), "Bob Jones");
    }

    #[test]
    fn windows_1252_bytes_are_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        // "José" with 0xE9 (é in Windows-1252, invalid UTF-8)
        f.write_all(b"Name,DOB\nJos\xE9 Garcia,2010-01-01\n").unwrap();
        drop(f);

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0].value(0), "José Garcia");
    }

    #[test]
    fn batches_are_bounded_and_terminate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.csv");
        let mut content = String::from("Name,DOB\n");
        for i in 0..7 {
            content.push_str(&format!("Student {i},2010-01-0{}\n", (i % 9) + 1));
        }
        std::fs::write(&path, content).unwrap();

        let mut batches = DelimitedBatches::open(&path).unwrap();
        assert_eq!(batches.header(), &["Name", "DOB"]);
        assert_eq!(batches.next_batch(3).unwrap().len(), 3);
        assert_eq!(batches.next_batch(3).unwrap().len(), 3);
        assert_eq!(batches.next_batch(3).unwrap().len(), 1);
        assert!(batches.next_batch(3).unwrap().is_empty());
    }
}
