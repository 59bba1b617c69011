//! Multi-invocation drain helper for `dir-iterator drain`.
//!
//! Plays the host's role: each cycle polls the change signal, lets the change
//! detector decide whether to run, and invokes the engine once.

use crate::core::types::IterationState;
use crate::io::loader::ItemLoader;
use crate::io::scan::FileScanner;
use crate::io::state_store::ProgressRepository;
use crate::iterate::{DirectoryIterator, IterationRequest, IterationResult};
use crate::trigger::{AlwaysChanged, ChangeDetector};

/// Reason why `run_drain` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// Every candidate is processed.
    AllProcessed,
    /// The last invocation found only files that failed to load.
    Exhausted,
    /// The directory holds no eligible files.
    Empty,
    /// The directory path is empty or missing.
    Invalid,
    /// The configured invocation limit was reached while items remained.
    MaxIterations { max_iterations: u32 },
}

/// Summary of a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOutcome {
    pub invocations: u32,
    pub loaded: u32,
    /// Processed/total counts reported by the last invocation.
    pub processed: usize,
    pub total: usize,
    pub stop: LoopStop,
}

/// Invoke the engine until it stops advancing or `max_iterations` is reached.
///
/// `request.reset` applies to the first invocation only.
pub fn run_drain<R, L, S, F>(
    engine: &DirectoryIterator<R, L, S>,
    request: &IterationRequest,
    max_iterations: Option<u32>,
    mut on_step: F,
) -> DrainOutcome
where
    R: ProgressRepository,
    L: ItemLoader,
    S: FileScanner,
    F: FnMut(&IterationResult<L::Item>),
{
    let mut signal = AlwaysChanged::new();
    let mut detector = ChangeDetector::new();
    let mut request = request.clone();
    let mut outcome = DrainOutcome {
        invocations: 0,
        loaded: 0,
        processed: 0,
        total: 0,
        stop: LoopStop::AllProcessed,
    };

    loop {
        if let Some(limit) = max_iterations {
            if outcome.invocations >= limit {
                outcome.stop = LoopStop::MaxIterations {
                    max_iterations: limit,
                };
                return outcome;
            }
        }
        if !detector.should_run(signal.poll()) {
            continue;
        }

        let result = engine.advance(&request);
        request.reset = false;
        outcome.invocations += 1;
        outcome.processed = result.current_index;
        outcome.total = result.total_count;
        on_step(&result);

        outcome.stop = match result.state {
            IterationState::Advancing => {
                outcome.loaded += 1;
                continue;
            }
            IterationState::AllProcessed => LoopStop::AllProcessed,
            IterationState::Exhausted => LoopStop::Exhausted,
            IterationState::Empty => LoopStop::Empty,
            IterationState::Invalid => LoopStop::Invalid,
        };
        return outcome;
    }
}
