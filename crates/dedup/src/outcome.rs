use rosterkit_core::Record;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Aggregate counters for one detection run. Invariant:
/// `clean + duplicate == total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupeStats {
    pub total: usize,
    pub clean: usize,
    pub duplicate: usize,
    /// Percentage of duplicates over total, rounded to two decimals.
    pub duplicate_percentage: f64,
}

impl DedupeStats {
    pub fn from_counts(total: usize, clean: usize, duplicate: usize) -> Self {
        let duplicate_percentage = if total > 0 {
            (duplicate as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };
        Self { total, clean, duplicate, duplicate_percentage }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Disjoint partition of all input records: one representative per identity
/// group in `clean`, everything else in `duplicate`.
#[derive(Debug)]
pub struct DedupeOutcome {
    pub clean: Vec<Record>,
    pub duplicate: Vec<Record>,
    pub stats: DedupeStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let stats = DedupeStats::from_counts(3, 2, 1);
        assert_eq!(stats.duplicate_percentage, 33.33);
        let stats = DedupeStats::from_counts(1000, 850, 150);
        assert_eq!(stats.duplicate_percentage, 15.0);
    }

    #[test]
    fn empty_run_is_zero_percent() {
        let stats = DedupeStats::from_counts(0, 0, 0);
        assert_eq!(stats.duplicate_percentage, 0.0);
    }
}
