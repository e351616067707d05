//! `rosterkit-classify` — heuristic column classification.
//!
//! Two deterministic, single-pass phases: header patterns first, then
//! content sniffing over still-unmapped columns. Pure engine crate: receives
//! a header and sampled rows, returns a mapping. No IO dependencies.

pub mod mapping;
pub mod patterns;
pub mod sniff;

pub use mapping::{FieldClassifier, FieldMapping};
