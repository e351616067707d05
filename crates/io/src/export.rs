// Partition export: clean/duplicate tables written as delimited text or a
// spreadsheet, inferred from the destination path's extension.

use std::path::Path;

use log::info;
use rosterkit_core::Table;
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use crate::error::ExportError;

/// Write a table to `path`, choosing the format from the extension:
/// `.xlsx` gets a workbook, `.tsv` tab-delimited text, anything else CSV.
pub fn export_table(table: &Table, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::Write(e.to_string()))?;
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "xlsx" => export_xlsx(table, path),
        "xls" => Err(ExportError::UnsupportedFormat(
            "xls (legacy workbooks are read-only; export to xlsx)".into(),
        )),
        "tsv" => export_delimited(table, path, b'\t'),
        _ => export_delimited(table, path, b','),
    }?;

    info!("exported {} rows to {}", table.len(), path.display());
    Ok(())
}

fn export_delimited(table: &Table, path: &Path, delimiter: u8) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ExportError::Write(e.to_string()))?;

    writer
        .write_record(&table.header)
        .map_err(|e| ExportError::Write(e.to_string()))?;
    for record in &table.rows {
        writer
            .write_record(&record.values)
            .map_err(|e| ExportError::Write(e.to_string()))?;
    }
    writer.flush().map_err(|e| ExportError::Write(e.to_string()))
}

fn export_xlsx(table: &Table, path: &Path) -> Result<(), ExportError> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.header.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(|e| ExportError::Write(e.to_string()))?;
    }
    for (row, record) in table.rows.iter().enumerate() {
        for (col, value) in record.values.iter().enumerate() {
            if !value.is_empty() {
                worksheet
                    .write_string(row as u32 + 1, col as u16, value)
                    .map_err(|e| ExportError::Write(e.to_string()))?;
            }
        }
    }

    workbook
        .save(path)
        .map_err(|e| ExportError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterkit_core::Record;
    use tempfile::tempdir;

    fn sample() -> Table {
        let mut t = Table::new(vec!["Name".into(), "DOB".into()]);
        t.rows.push(Record::new(0, vec!["Alice Smith".into(), "2010-01-01".into()]));
        t.rows.push(Record::new(1, vec!["Bob Jones".into(), "2011-02-02".into()]));
        t
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        export_table(&sample(), &path).unwrap();

        let table = crate::delimited::read_table(&path).unwrap();
        assert_eq!(table.header, vec!["Name", "DOB"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].value(0), "Bob Jones");
    }

    #[test]
    fn tsv_uses_tabs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.tsv");
        export_table(&sample(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\t'));
    }

    #[test]
    fn xlsx_written_and_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.xlsx");
        export_table(&sample(), &path).unwrap();

        let table = crate::workbook::read_table(&path).unwrap();
        assert_eq!(table.header, vec!["Name", "DOB"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn legacy_xls_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.xls");
        let err = export_table(&sample(), &path).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/clean.csv");
        export_table(&sample(), &path).unwrap();
        assert!(path.exists());
    }
}
