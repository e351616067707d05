use rosterkit_core::{Chunk, Record};
use rosterkit_dedup::{DedupeConfig, DuplicateDetector};

fn header() -> Vec<String> {
    vec!["StudentName".into(), "DateOfBirth".into(), "AcademicYear".into()]
}

fn rec(origin: usize, name: &str, dob: &str, year: &str) -> Record {
    Record::new(origin, vec![name.into(), dob.into(), year.into()])
}

fn exact_config() -> DedupeConfig {
    DedupeConfig::default()
}

fn fuzzy_config(threshold: u8) -> DedupeConfig {
    DedupeConfig {
        fuzzy_match: true,
        fuzzy_threshold: threshold,
        ..Default::default()
    }
}

// -------------------------------------------------------------------------
// Partition invariant + exact-mode uniqueness
// -------------------------------------------------------------------------

#[test]
fn partition_invariant_holds_across_chunks() {
    let mut det = DuplicateDetector::new(exact_config(), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Bob Jones", "2011-02-02", "2023"),
            rec(2, "Alice Smith", "2010-01-01", "2023"),
        ],
    ))
    .unwrap();
    det.process_chunk(Chunk::new(
        1,
        vec![
            rec(3, "Carol White", "2012-03-03", "2024"),
            rec(4, "Bob Jones", "2011-02-02", "2023"),
        ],
    ))
    .unwrap();
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.total, 5);
    assert_eq!(
        outcome.stats.clean + outcome.stats.duplicate,
        outcome.stats.total
    );
    assert_eq!(outcome.clean.len(), outcome.stats.clean);
    assert_eq!(outcome.duplicate.len(), outcome.stats.duplicate);
}

#[test]
fn exact_clean_partition_has_unique_keys() {
    let mut det = DuplicateDetector::new(exact_config(), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Alice Smith", "2010-01-01", "2023"),
            rec(2, "Alice Smith", "2010-01-01", "2024"),
            rec(3, "Bob Jones", "2011-02-02", "2023"),
        ],
    ))
    .unwrap();
    let outcome = det.finish().unwrap();

    let mut keys: Vec<Vec<String>> = outcome.clean.iter().map(|r| r.values.clone()).collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), before, "clean partition contains a repeated key");
}

#[test]
fn exact_detection_is_idempotent_over_clean_partition() {
    let mut det = DuplicateDetector::new(exact_config(), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Alice Smith", "2010-01-01", "2023"),
            rec(2, "Bob Jones", "2011-02-02", "2023"),
        ],
    ))
    .unwrap();
    let first = det.finish().unwrap();

    let mut rerun = DuplicateDetector::new(exact_config(), &header()).unwrap();
    rerun.process_chunk(Chunk::new(0, first.clean.clone())).unwrap();
    let second = rerun.finish().unwrap();

    assert_eq!(second.stats.duplicate, 0);
    assert_eq!(second.stats.clean, first.stats.clean);
}

// -------------------------------------------------------------------------
// Chunk-boundary reconciliation
// -------------------------------------------------------------------------

#[test]
fn identical_records_split_across_chunks_leave_one_survivor() {
    // Rows 0, 1 and 3 identical, chunk size 2: the chunk-0 pass catches
    // row 1, reconciliation must catch row 3.
    let mut det = DuplicateDetector::new(exact_config(), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "Alice Smith", "2010-01-01", "2023"),
        ],
    ))
    .unwrap();
    det.process_chunk(Chunk::new(
        1,
        vec![
            rec(2, "Bob Jones", "2011-02-02", "2023"),
            rec(3, "Alice Smith", "2010-01-01", "2023"),
        ],
    ))
    .unwrap();
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.clean, 2);
    assert_eq!(outcome.stats.duplicate, 2);
    let survivors: Vec<_> = outcome
        .clean
        .iter()
        .filter(|r| r.value(0) == "Alice Smith")
        .collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].origin, 0);
}

// -------------------------------------------------------------------------
// Fuzzy mode
// -------------------------------------------------------------------------

#[test]
fn fuzzy_threshold_100_matches_exact_name_equality() {
    let mut det = DuplicateDetector::new(fuzzy_config(100), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "Alice Smith", "2010-01-01", "2023"),
            rec(1, "alice smith ", "2010-01-01", "2023"),
            rec(2, "Alice Smyth", "2010-01-01", "2023"),
        ],
    ))
    .unwrap();
    let outcome = det.finish().unwrap();

    // Names are normalized (lowercase, trim) before scoring, so only the
    // exact-name pair collapses at threshold 100.
    assert_eq!(outcome.stats.duplicate, 1);
    assert_eq!(outcome.duplicate[0].origin, 1);
}

#[test]
fn fuzzy_anchor_only_not_transitive() {
    // B is within threshold of anchor A; C is within threshold of B but not
    // of A. The greedy clustering compares survivors against the anchor
    // only, so C is never matched. Known limitation, pinned on purpose.
    let mut det = DuplicateDetector::new(fuzzy_config(80), &header()).unwrap();
    det.process_chunk(Chunk::new(
        0,
        vec![
            rec(0, "abcdefghij", "2010-01-01", "2023"),
            rec(1, "abcdefghxx", "2010-01-01", "2023"), // sim(A) = 80
            rec(2, "abcdefxxxx", "2010-01-01", "2023"), // sim(A) = 60, sim(B) = 80
        ],
    ))
    .unwrap();
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.clean, 2);
    assert_eq!(outcome.stats.duplicate, 1);
    assert_eq!(outcome.duplicate[0].origin, 1);
    assert!(outcome.clean.iter().any(|r| r.origin == 2));
}

#[test]
fn fuzzy_cross_chunk_gap_is_not_reconciled() {
    // Near-identical names land in different chunks. Reconciliation is
    // exact-only, so the pair survives. Documented gap, not a bug to fix.
    let mut det = DuplicateDetector::new(fuzzy_config(80), &header()).unwrap();
    det.process_chunk(Chunk::new(0, vec![rec(0, "abcdefghij", "2010-01-01", "2023")]))
        .unwrap();
    det.process_chunk(Chunk::new(1, vec![rec(1, "abcdefghxx", "2010-01-01", "2023")]))
        .unwrap();
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.duplicate, 0);
    assert_eq!(outcome.stats.clean, 2);
}

#[test]
fn fuzzy_exact_cross_chunk_duplicates_are_reconciled() {
    // Identical raw records split across chunks are still merged by the
    // exact-only reconciliation pass, even in fuzzy mode.
    let mut det = DuplicateDetector::new(fuzzy_config(90), &header()).unwrap();
    det.process_chunk(Chunk::new(0, vec![rec(0, "Alice Smith", "2010-01-01", "2023")]))
        .unwrap();
    det.process_chunk(Chunk::new(1, vec![rec(1, "Alice Smith", "2010-01-01", "2023")]))
        .unwrap();
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.clean, 1);
    assert_eq!(outcome.stats.duplicate, 1);
    assert_eq!(outcome.duplicate[0].origin, 1);
}

// -------------------------------------------------------------------------
// Generated roster with injected duplicates
// -------------------------------------------------------------------------

#[test]
fn generated_roster_duplicate_rate_is_recovered() {
    // 850 distinct records plus 150 copies, fed in chunks of 100 so many
    // copies land in a different chunk than their original.
    let mut records = Vec::new();
    for i in 0..850usize {
        records.push(rec(
            i,
            &format!("Student{i} Surname{i}"),
            &format!("2010-{:02}-{:02}", (i % 12) + 1, (i % 28) + 1),
            "2023",
        ));
    }
    for i in 0..150usize {
        let src = (i * 5) % 850;
        let mut copy = records[src].clone();
        copy.origin = 850 + i;
        records.push(copy);
    }

    let mut det = DuplicateDetector::new(exact_config(), &header()).unwrap();
    for (seq, batch) in records.chunks(100).enumerate() {
        det.process_chunk(Chunk::new(seq, batch.to_vec())).unwrap();
    }
    let outcome = det.finish().unwrap();

    assert_eq!(outcome.stats.total, 1000);
    assert_eq!(outcome.stats.clean + outcome.stats.duplicate, 1000);
    assert_eq!(outcome.stats.duplicate, 150);
    assert_eq!(outcome.stats.duplicate_percentage, 15.0);
}
