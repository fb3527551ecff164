//! Coalescing of layout requests.
//!
//! Iterative strategies may run across several frames. While a run of some
//! algorithm is in flight, further requests for the same algorithm do not
//! stack: only the most recent one is kept and handed out when the running
//! one finishes.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::LayoutOptions;

/// A request to lay out the current element set.
///
/// Carries no elements: the run reads the element set at the time it starts,
/// so it can never lay out a stale set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRequest {
    pub algorithm: String,
    pub options: LayoutOptions,
}

/// What happened to a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nothing of this algorithm was running; the caller should start this run.
    Start(LayoutRequest),
    /// A run is in flight; the request replaced any previously queued one.
    Coalesced,
}

/// Tracks in-flight runs and at most one queued request per algorithm.
#[derive(Debug, Default)]
pub struct LayoutQueue {
    running: HashSet<String>,
    queued: HashMap<String, LayoutRequest>,
}

impl LayoutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, request: LayoutRequest) -> Submission {
        if self.running.insert(request.algorithm.clone()) {
            return Submission::Start(request);
        }
        if let Some(previous) = self.queued.insert(request.algorithm.clone(), request) {
            debug!(algorithm = previous.algorithm; "Superseded queued layout request");
        }
        Submission::Coalesced
    }

    /// Mark the run of `algorithm` finished.
    ///
    /// Returns the queued request to start next, if any; the algorithm stays
    /// marked as running in that case.
    pub fn finish(&mut self, algorithm: &str) -> Option<LayoutRequest> {
        match self.queued.remove(algorithm) {
            Some(next) => Some(next),
            None => {
                self.running.remove(algorithm);
                None
            }
        }
    }

    pub fn is_running(&self, algorithm: &str) -> bool {
        self.running.contains(algorithm)
    }

    pub fn queued(&self, algorithm: &str) -> Option<&LayoutRequest> {
        self.queued.get(algorithm)
    }
}
