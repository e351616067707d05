use std::collections::{BTreeMap, BTreeSet};

use log::info;
use rosterkit_core::{Chunk, Record};

use crate::config::DedupeConfig;
use crate::error::DedupError;
use crate::outcome::{DedupeOutcome, DedupeStats};
use crate::scorer::{self, Scorer};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One detection run: chunks are fed strictly in sequence, then a single
/// reconciliation pass closes the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Processing(usize),
    Reconciling,
    Done,
}

impl std::fmt::Display for DetectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing(seq) => write!(f, "processing(chunk {seq})"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Done => write!(f, "done"),
        }
    }
}

struct IdentityColumns {
    name: usize,
    dob: usize,
    year: usize,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Classifies records as clean or duplicate per chunk, then reconciles
/// across chunk boundaries with one exact-only pass over the accumulated
/// clean partition.
///
/// Exact mode keys on the raw (name, dob, year) triple; the record with the
/// smallest origin index in each group is the representative. Fuzzy mode
/// groups by (dob, year), normalizes names, and clusters greedily around
/// anchors; see `process_fuzzy` for the non-transitivity caveat.
pub struct DuplicateDetector {
    config: DedupeConfig,
    scorer: Box<dyn Scorer>,
    columns: IdentityColumns,
    state: DetectorState,
    total: usize,
    clean: Vec<Record>,
    duplicate: Vec<Record>,
}

impl std::fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("total", &self.total)
            .field("clean", &self.clean.len())
            .field("duplicate", &self.duplicate.len())
            .finish_non_exhaustive()
    }
}

impl DuplicateDetector {
    /// Resolve identity columns against the dataset's effective header.
    pub fn new(config: DedupeConfig, header: &[String]) -> Result<Self, DedupError> {
        config.validate()?;
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DedupError::MissingColumn { column: name.to_string() })
        };
        let columns = IdentityColumns {
            name: find(&config.name_column)?,
            dob: find(&config.dob_column)?,
            year: find(&config.year_column)?,
        };
        let scorer = scorer::build(config.similarity);
        Ok(Self {
            config,
            scorer,
            columns,
            state: DetectorState::Idle,
            total: 0,
            clean: Vec::new(),
            duplicate: Vec::new(),
        })
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Feed the next chunk. Chunks must arrive with consecutive sequence
    /// numbers starting at 0 and are processed strictly sequentially.
    pub fn process_chunk(&mut self, chunk: Chunk) -> Result<(), DedupError> {
        let expected = match self.state {
            DetectorState::Idle => 0,
            DetectorState::Processing(last) => last + 1,
            state => {
                return Err(DedupError::State {
                    operation: "process chunk",
                    state: state.to_string(),
                })
            }
        };
        if chunk.seq != expected {
            return Err(DedupError::ChunkSequence { expected, got: chunk.seq });
        }

        self.state = DetectorState::Processing(chunk.seq);
        self.total += chunk.len();

        if self.config.fuzzy_match {
            self.process_fuzzy(chunk.records);
        } else {
            self.process_exact(chunk.records);
        }
        Ok(())
    }

    /// Close the run: reconcile across chunk boundaries and return the
    /// partitions plus aggregate stats.
    pub fn finish(&mut self) -> Result<DedupeOutcome, DedupError> {
        match self.state {
            DetectorState::Idle | DetectorState::Processing(_) => {}
            state => {
                return Err(DedupError::State {
                    operation: "finish",
                    state: state.to_string(),
                })
            }
        }

        self.state = DetectorState::Reconciling;
        self.reconcile();
        self.state = DetectorState::Done;

        let clean = std::mem::take(&mut self.clean);
        let duplicate = std::mem::take(&mut self.duplicate);
        let stats = DedupeStats::from_counts(self.total, clean.len(), duplicate.len());
        debug_assert_eq!(stats.clean + stats.duplicate, stats.total);

        info!(
            "duplicate detection complete: {} total, {} clean, {} duplicate ({}%)",
            stats.total, stats.clean, stats.duplicate, stats.duplicate_percentage
        );

        Ok(DedupeOutcome { clean, duplicate, stats })
    }

    fn identity_key(&self, record: &Record) -> (String, String, String) {
        (
            record.value(self.columns.name).to_string(),
            record.value(self.columns.dob).to_string(),
            record.value(self.columns.year).to_string(),
        )
    }

    /// Exact mode: group by the raw composite key; smallest origin wins.
    fn process_exact(&mut self, records: Vec<Record>) {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&i| records[i].origin);

        let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
        let mut is_duplicate = vec![false; records.len()];
        for &i in &order {
            if !seen.insert(self.identity_key(&records[i])) {
                is_duplicate[i] = true;
            }
        }

        for (i, record) in records.into_iter().enumerate() {
            if is_duplicate[i] {
                self.duplicate.push(record);
            } else {
                self.clean.push(record);
            }
        }
    }

    /// Fuzzy mode: group by (dob, year) and cluster greedily around anchors
    /// in origin order. A record scoring >= threshold against the anchor is
    /// a duplicate and leaves the comparison pool.
    ///
    /// The clustering is anchor-only and non-transitive: a record similar
    /// only to another duplicate (not the anchor itself) is never matched.
    /// Deliberately preserved; the tests pin it.
    fn process_fuzzy(&mut self, records: Vec<Record>) {
        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            let key = (
                record.value(self.columns.dob).to_string(),
                record.value(self.columns.year).to_string(),
            );
            groups.entry(key).or_default().push(i);
        }

        let threshold = self.config.fuzzy_threshold;
        let origins: Vec<usize> = records.iter().map(|r| r.origin).collect();
        let names: Vec<String> = records
            .iter()
            .map(|r| r.value(self.columns.name).trim().to_lowercase())
            .collect();
        let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();

        for idxs in groups.values_mut() {
            idxs.sort_by_key(|&i| origins[i]);

            if idxs.len() == 1 {
                self.clean.push(slots[idxs[0]].take().unwrap());
                continue;
            }

            let mut assigned = vec![false; idxs.len()];
            for a in 0..idxs.len() {
                if assigned[a] {
                    continue;
                }
                assigned[a] = true;
                for b in (a + 1)..idxs.len() {
                    if assigned[b] {
                        continue;
                    }
                    if self.scorer.score(&names[idxs[a]], &names[idxs[b]]) >= threshold {
                        assigned[b] = true;
                        self.duplicate.push(slots[idxs[b]].take().unwrap());
                    }
                }
                self.clean.push(slots[idxs[a]].take().unwrap());
            }
        }
    }

    /// Cross-chunk reconciliation: one exact-only pass over the accumulated
    /// clean partition, merging duplicates whose occurrences landed in
    /// different chunks. Fuzzy near-duplicates split across chunk boundaries
    /// are not caught here; that gap is deliberate.
    fn reconcile(&mut self) {
        let records = std::mem::take(&mut self.clean);
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&i| records[i].origin);

        let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
        let mut moved = vec![false; records.len()];
        for &i in &order {
            if !seen.insert(self.identity_key(&records[i])) {
                moved[i] = true;
            }
        }

        let moved_count = moved.iter().filter(|&&m| m).count();
        if moved_count > 0 {
            info!("reconciliation moved {moved_count} cross-chunk duplicates");
        }

        for (i, record) in records.into_iter().enumerate() {
            if moved[i] {
                self.duplicate.push(record);
            } else {
                self.clean.push(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        vec!["StudentName".into(), "DateOfBirth".into(), "AcademicYear".into()]
    }

    fn rec(origin: usize, name: &str, dob: &str, year: &str) -> Record {
        Record::new(origin, vec![name.into(), dob.into(), year.into()])
    }

    #[test]
    fn missing_identity_column_is_an_error() {
        let header = vec!["Name".to_string(), "DOB".to_string()];
        let err = DuplicateDetector::new(DedupeConfig::default(), &header).unwrap_err();
        assert!(matches!(err, DedupError::MissingColumn { .. }));
    }

    #[test]
    fn exact_smallest_origin_is_representative() {
        let mut det = DuplicateDetector::new(DedupeConfig::default(), &header()).unwrap();
        let records = vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Bob Jones", "2011-02-02", "2023"),
            rec(2, "Alice Smith", "2010-01-01", "2023"),
        ];
        det.process_chunk(Chunk::new(0, records)).unwrap();
        let outcome = det.finish().unwrap();
        assert_eq!(outcome.stats.total, 3);
        assert_eq!(outcome.stats.clean, 2);
        assert_eq!(outcome.stats.duplicate, 1);
        assert_eq!(outcome.duplicate[0].origin, 2);
    }

    #[test]
    fn exact_key_is_raw_and_case_sensitive() {
        let mut det = DuplicateDetector::new(DedupeConfig::default(), &header()).unwrap();
        let records = vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "ALICE SMITH", "2010-01-01", "2023"),
        ];
        det.process_chunk(Chunk::new(0, records)).unwrap();
        let outcome = det.finish().unwrap();
        assert_eq!(outcome.stats.duplicate, 0);
    }

    #[test]
    fn fuzzy_matches_only_within_dob_year_group() {
        let config = DedupeConfig { fuzzy_match: true, fuzzy_threshold: 90, ..Default::default() };
        let mut det = DuplicateDetector::new(config, &header()).unwrap();
        let records = vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Alice Smith", "2010-01-01", "2024"),
            rec(2, "alice smith", "2010-01-01", "2023"),
        ];
        det.process_chunk(Chunk::new(0, records)).unwrap();
        let outcome = det.finish().unwrap();
        // origin 2 matches origin 0 (same dob/year); origin 1 is another year
        assert_eq!(outcome.stats.clean, 2);
        assert_eq!(outcome.stats.duplicate, 1);
        assert_eq!(outcome.duplicate[0].origin, 2);
    }

    #[test]
    fn chunk_sequence_enforced() {
        let mut det = DuplicateDetector::new(DedupeConfig::default(), &header()).unwrap();
        let err = det.process_chunk(Chunk::new(1, vec![])).unwrap_err();
        assert!(matches!(err, DedupError::ChunkSequence { expected: 0, got: 1 }));
    }

    #[test]
    fn detector_cannot_be_reused_after_finish() {
        let mut det = DuplicateDetector::new(DedupeConfig::default(), &header()).unwrap();
        det.process_chunk(Chunk::new(0, vec![rec(0, "A B", "2010-01-01", "2023")])).unwrap();
        det.finish().unwrap();
        assert_eq!(det.state(), DetectorState::Done);
        assert!(det.process_chunk(Chunk::new(1, vec![])).is_err());
        assert!(det.finish().is_err());
    }

    #[test]
    fn empty_run_finishes_clean() {
        let mut det = DuplicateDetector::new(DedupeConfig::default(), &header()).unwrap();
        let outcome = det.finish().unwrap();
        assert_eq!(outcome.stats.total, 0);
        assert_eq!(outcome.stats.duplicate_percentage, 0.0);
    }
}
