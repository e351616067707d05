use std::collections::HashSet;

use log::info;
use rosterkit_core::{CanonicalField, Table};

use crate::patterns::HeaderPatterns;
use crate::sniff::ContentDetectors;

/// Values sampled per column for content sniffing.
const SAMPLE_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// FieldMapping
// ---------------------------------------------------------------------------

/// Original column name → canonical field, in column order. Each canonical
/// field is claimed by at most one column; later ambiguous candidates stay
/// unmapped rather than overwriting an earlier claim.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    entries: Vec<(String, CanonicalField)>,
}

impl FieldMapping {
    pub fn get(&self, original: &str) -> Option<CanonicalField> {
        self.entries
            .iter()
            .find(|(name, _)| name == original)
            .map(|(_, field)| *field)
    }

    pub fn is_claimed(&self, field: CanonicalField) -> bool {
        self.entries.iter().any(|(_, f)| *f == field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), *field))
    }

    /// Rewrite a header: mapped columns take their canonical name, unmapped
    /// columns pass through under their original names. Column order is
    /// preserved.
    pub fn rename_header(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|h| match self.get(h) {
                Some(field) => field.as_str().to_string(),
                None => h.clone(),
            })
            .collect()
    }

    fn claim(&mut self, original: &str, field: CanonicalField) -> bool {
        if self.is_claimed(field) {
            return false;
        }
        self.entries.push((original.to_string(), field));
        true
    }
}

// ---------------------------------------------------------------------------
// FieldClassifier
// ---------------------------------------------------------------------------

/// Two-phase deterministic classifier. Phase 1 matches normalized headers
/// against ordered pattern lists; phase 2 sniffs the contents of columns the
/// header phase left unmapped.
pub struct FieldClassifier {
    patterns: HeaderPatterns,
    detectors: ContentDetectors,
}

impl FieldClassifier {
    pub fn new() -> Self {
        Self {
            patterns: HeaderPatterns::new(),
            detectors: ContentDetectors::new(),
        }
    }

    /// Classify a table's columns. The table is typically the ingestion
    /// preview; only a bounded sample per column is inspected.
    pub fn classify(&self, table: &Table) -> FieldMapping {
        let mut mapping = FieldMapping::default();
        let mut mapped_cols: HashSet<usize> = HashSet::new();

        // Phase 1: header patterns, column order, first match wins.
        for (col, header) in table.header.iter().enumerate() {
            if let Some(field) = self.patterns.match_header(header) {
                if mapping.claim(header, field) {
                    mapped_cols.insert(col);
                }
            }
        }

        // Phase 2: content sniffing over still-unmapped columns. A column
        // gets a single detector verdict; if that canonical field is already
        // claimed the column stays unmapped.
        for (col, header) in table.header.iter().enumerate() {
            if mapped_cols.contains(&col) {
                continue;
            }
            let values = table.column_values(col);
            let sample: Vec<&str> = values.into_iter().take(SAMPLE_SIZE).collect();
            if let Some(field) = self.detectors.detect(&sample) {
                mapping.claim(header, field);
            }
        }

        info!(
            "classified {} of {} columns",
            mapping.len(),
            table.header.len()
        );
        for (original, field) in mapping.iter() {
            info!("  {original} -> {field}");
        }

        mapping
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterkit_core::Record;

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(header.iter().map(|h| h.to_string()).collect());
        for (i, row) in rows.iter().enumerate() {
            t.rows
                .push(Record::new(i, row.iter().map(|v| v.to_string()).collect()));
        }
        t
    }

    #[test]
    fn header_phase_maps_common_headers() {
        let t = table(&["Full Name", "Birth Date", "Yr"], &[]);
        let mapping = FieldClassifier::new().classify(&t);
        assert_eq!(mapping.get("Full Name"), Some(CanonicalField::StudentName));
        assert_eq!(mapping.get("Birth Date"), Some(CanonicalField::DateOfBirth));
        assert_eq!(mapping.get("Yr"), Some(CanonicalField::AcademicYear));
    }

    #[test]
    fn first_header_claim_wins() {
        // Both headers match the name patterns; the second stays unmapped.
        let t = table(&["Name", "Surname"], &[]);
        let mapping = FieldClassifier::new().classify(&t);
        assert_eq!(mapping.get("Name"), Some(CanonicalField::StudentName));
        assert_eq!(mapping.get("Surname"), None);
    }

    #[test]
    fn content_phase_fills_unmapped_columns() {
        let t = table(
            &["col_a", "col_b"],
            &[
                &["Alice Smith", "a@example.com"],
                &["Bob Jones", "b@example.org"],
                &["Carol Ann White", "c@example.net"],
            ],
        );
        let mapping = FieldClassifier::new().classify(&t);
        assert_eq!(mapping.get("col_a"), Some(CanonicalField::StudentName));
        assert_eq!(mapping.get("col_b"), Some(CanonicalField::EmailAddress));
    }

    #[test]
    fn empty_column_is_never_classified() {
        let t = table(&["blank"], &[&[""], &[""], &[""]]);
        let mapping = FieldClassifier::new().classify(&t);
        assert_eq!(mapping.get("blank"), None);
    }

    #[test]
    fn content_verdict_for_claimed_field_leaves_column_unmapped() {
        // "Name" claims StudentName via headers; the second name-like column
        // gets a StudentName verdict from sniffing and therefore nothing.
        let t = table(
            &["Name", "guardian"],
            &[
                &["Alice Smith", "Mary Smith"],
                &["Bob Jones", "Carl Jones"],
                &["Carol White", "Diane White"],
            ],
        );
        let mapping = FieldClassifier::new().classify(&t);
        assert_eq!(mapping.get("Name"), Some(CanonicalField::StudentName));
        assert_eq!(mapping.get("guardian"), None);
    }

    #[test]
    fn rename_header_preserves_order_and_passthrough() {
        let t = table(&["Full Name", "notes", "Yr"], &[]);
        let mapping = FieldClassifier::new().classify(&t);
        let renamed = mapping.rename_header(&t.header);
        assert_eq!(renamed, vec!["StudentName", "notes", "AcademicYear"]);
    }
}
