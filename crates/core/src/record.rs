use serde::Serialize;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single row, positionally aligned with the header of its containing
/// table or stream. `origin` is the stable source-file row index (0-based,
/// data rows only) used as the tie-breaker when picking a duplicate group's
/// representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub origin: usize,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(origin: usize, values: Vec<String>) -> Self {
        Self { origin, values }
    }

    /// Value at a column index. Rows shorter than the header read as empty.
    pub fn value(&self, col: usize) -> &str {
        self.values.get(col).map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A bounded, ordered batch of records with a monotonically increasing
/// sequence number. Chunks are the unit of detection work.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub seq: usize,
    pub records: Vec<Record>,
}

impl Chunk {
    pub fn new(seq: usize, records: Vec<Record>) -> Self {
        Self { seq, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A fully materialized header + rows, used for small direct-mode inputs,
/// previews, and the exported partitions.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self { header, rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// All non-empty values of one column, in row order.
    pub fn column_values(&self, col: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.value(col))
            .filter(|v| !v.is_empty())
            .collect()
    }
}
