//! State tracking for a crawl run
//!
//! # Components
//!
//! - `CrawlPhase`: Where the orchestrator is in the key / entry pipeline
//! - `PhaseTracker`: Enforces legal phase transitions
//! - `RequestClock`: Request counting and spacing for the shared request gate

mod phase;
mod request_clock;

pub use phase::{CrawlPhase, PhaseTracker};
pub use request_clock::RequestClock;
