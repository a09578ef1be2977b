//! Lifecycle phases and their terminal results

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::PhaseError;

/// A top-level lifecycle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dev,
    Build,
    Start,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Dev => "dev",
            Phase::Build => "build",
            Phase::Start => "start",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Phase::Dev),
            "build" => Ok(Phase::Build),
            "start" => Ok(Phase::Start),
            other => Err(other.to_string()),
        }
    }
}

/// Where a phase driver is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Starting,
    ToolCheck,
    InstallingDependencies,
    Transpiling,
    Bundling,
    Minifying,
    AllocatingPort,
    ProvisioningCertificates,
    Listening,
    Failed,
    Done,
}

/// Tracks the current state of one phase run
#[derive(Debug)]
pub struct PhaseTracker {
    phase: Phase,
    state: PhaseState,
}

impl PhaseTracker {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            state: PhaseState::Starting,
        }
    }

    pub fn enter(&mut self, state: PhaseState) {
        debug!("{}: {:?} -> {:?}", self.phase, self.state, state);
        self.state = state;
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Terminal failure, remembering the state the error happened in
    pub fn fail(self, error: PhaseError) -> PhaseResult {
        debug!("{}: {:?} -> Failed", self.phase, self.state);
        PhaseResult {
            phase: self.phase,
            reached: self.state,
            error: Some(error),
        }
    }

    /// Terminal success in `state` (`Done` or `Listening`)
    pub fn finish(mut self, state: PhaseState) -> PhaseResult {
        self.enter(state);
        PhaseResult {
            phase: self.phase,
            reached: state,
            error: None,
        }
    }
}

/// The only thing a phase reports to its caller
#[derive(Debug)]
pub struct PhaseResult {
    pub phase: Phase,

    /// Last state entered; for failures, the state the error occurred in
    pub reached: PhaseState,

    pub error: Option<PhaseError>,
}

impl PhaseResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable failure cause
    pub fn cause(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
