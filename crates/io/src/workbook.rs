// Excel workbook input (xlsx, xls, xlsb, ods) via calamine's auto-detecting
// opener. One-way conversion: cells become strings positionally aligned with
// the first row, which is taken as the header.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rosterkit_core::{Record, Table};

use crate::error::IngestError;

/// Convert one cell to its string form. Dates come out ISO so downstream
/// identity keys are stable across CSV and workbook sources.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono_midnight() => ndt.format("%Y-%m-%d").to_string(),
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{}", dt.as_f64()),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn chrono_midnight() -> chrono::NaiveTime {
    chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap()
}

fn open_first_range(path: &Path) -> Result<Range<Data>, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Open(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| IngestError::Open("workbook contains no sheets".into()))?;
    workbook
        .worksheet_range(first)
        .map_err(|e| IngestError::Open(format!("cannot read sheet '{first}': {e}")))
}

/// Fully materialize the first sheet: first row is the header, remaining
/// rows become records with their sheet-order origin index.
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    let range = open_first_range(path)?;
    let mut table = Table::default();
    for (i, row) in range.rows().enumerate() {
        let values: Vec<String> = row.iter().map(cell_to_string).collect();
        if i == 0 {
            table.header = values;
        } else {
            table.rows.push(Record::new(i - 1, values));
        }
    }
    Ok(table)
}

/// Estimate the data row count from the sheet's native dimensions.
pub fn estimate_rows(path: &Path) -> Result<usize, IngestError> {
    let range = open_first_range(path)?;
    Ok(range.height().saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Batched read
// ---------------------------------------------------------------------------

/// Bounded-offset batch reader over the first sheet. The sheet range is
/// decoded once by the reader; `next_batch` slices it at an increasing skip
/// offset so conversion buffers stay one batch wide.
pub struct WorkbookBatches {
    range: Range<Data>,
    header: Vec<String>,
    offset: usize,
}

impl WorkbookBatches {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        Self::from_range(open_first_range(path)?)
    }

    pub fn from_range(range: Range<Data>) -> Result<Self, IngestError> {
        let header = range
            .rows()
            .next()
            .map(|row| row.iter().map(cell_to_string).collect())
            .ok_or_else(|| IngestError::Open("sheet has no header row".into()))?;
        Ok(Self { range, header, offset: 0 })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data row count from the sheet's native dimensions.
    pub fn total_rows(&self) -> usize {
        self.range.height().saturating_sub(1)
    }

    /// Next batch of up to `n` rows starting at the current offset; an empty
    /// batch signals the end.
    pub fn next_batch(&mut self, n: usize) -> Result<Vec<Vec<String>>, IngestError> {
        let rows: Vec<Vec<String>> = self
            .range
            .rows()
            .skip(1 + self.offset)
            .take(n)
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        self.offset += rows.len();
        Ok(rows)
    }
}
