//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The orchestrator's lifecycle (idle, seeding, running, draining, terminated)
//! - `Task`: A unit of work on the frontier
//! - `VisitedSet`: The in-memory, run-scoped record of claimed URLs
//! - `WorkTracker`: Outstanding-work counter that detects quiescence

mod phase;
mod task;
mod tracker;
mod visited;

// Re-export main types
pub use phase::CrawlPhase;
pub use task::Task;
pub use tracker::WorkTracker;
pub use visited::VisitedSet;
