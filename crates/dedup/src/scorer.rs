use crate::config::SimilarityBackend;

/// Likeness score between two strings, 0..=100 (100 = identical).
/// Case-insensitive; callers pre-trim their inputs.
pub trait Scorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Build the scorer for a configured backend. Selection is explicit and
/// deterministic: output never varies with what happens to be installed.
pub fn build(backend: SimilarityBackend) -> Box<dyn Scorer> {
    match backend {
        SimilarityBackend::EditDistance => Box::new(EditDistanceScorer),
        SimilarityBackend::PrefixOverlap => Box::new(PrefixOverlapScorer),
    }
}

// ---------------------------------------------------------------------------
// Edit distance (primary)
// ---------------------------------------------------------------------------

/// Normalized Levenshtein ratio scaled to 0..=100.
pub struct EditDistanceScorer;

impl Scorer for EditDistanceScorer {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        (strsim::normalized_levenshtein(&a, &b) * 100.0).floor() as u8
    }
}

// ---------------------------------------------------------------------------
// Prefix overlap (fallback)
// ---------------------------------------------------------------------------

/// Deterministic fallback with a fully specified policy:
/// identical → 100; substring → floor(min_len/max_len * 90); otherwise
/// positionally equal characters over the zipped prefix →
/// floor(matches/max_len * 80); empty comparison → 0.
pub struct PrefixOverlapScorer;

impl Scorer for PrefixOverlapScorer {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();

        if a == b {
            return 100;
        }

        let a_len = a.chars().count();
        let b_len = b.chars().count();
        let max_len = a_len.max(b_len);

        if a.contains(&b) || b.contains(&a) {
            let min_len = a_len.min(b_len);
            return ((min_len as f64 / max_len as f64) * 90.0).floor() as u8;
        }

        let matches = a
            .chars()
            .zip(b.chars())
            .filter(|(x, y)| x == y)
            .count();
        if max_len == 0 {
            return 0;
        }
        ((matches as f64 / max_len as f64) * 80.0).floor() as u8
    }
}
