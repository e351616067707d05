//! `rosterkit-session` — one cleaning session, end to end.
//!
//! Owns the ingest → classify → detect pipeline, the materialized stream's
//! lifecycle, and the asynchronous worker that runs it all off the caller's
//! thread. The caller receives progress/result/error notifications over a
//! channel and never blocks.

pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use events::SessionEvent;
pub use session::{spawn_session, CleaningResult, CleaningSession, RunStats, SessionHandle};
