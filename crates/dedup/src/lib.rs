//! `rosterkit-dedup` — duplicate detection engine.
//!
//! Pure engine crate: receives pre-loaded record chunks, returns the
//! clean/duplicate partitions and aggregate stats. No IO dependencies.

pub mod config;
pub mod detector;
pub mod error;
pub mod outcome;
pub mod scorer;

pub use config::{DedupeConfig, SimilarityBackend};
pub use detector::{DetectorState, DuplicateDetector};
pub use error::DedupError;
pub use outcome::{DedupeOutcome, DedupeStats};
pub use scorer::{EditDistanceScorer, PrefixOverlapScorer, Scorer};
