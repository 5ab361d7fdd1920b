//! Orchestrator lifecycle phases
//!
//! The only legal path is `Idle -> Seeding -> Running -> Draining -> Terminated`.

use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Constructed, nothing started
    Idle,

    /// Frontier exists and the seed task is being pushed
    Seeding,

    /// Workers are consuming the frontier
    Running,

    /// Quiescence (or cancellation) observed; frontier closed, workers exiting
    Draining,

    /// Workers joined and the final report flushed
    Terminated,
}

impl CrawlPhase {
    /// Returns the phase that legally follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Seeding),
            Self::Seeding => Some(Self::Running),
            Self::Running => Some(Self::Draining),
            Self::Draining => Some(Self::Terminated),
            Self::Terminated => None,
        }
    }

    /// Returns true if moving from this phase to `to` is allowed
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Returns true once the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
