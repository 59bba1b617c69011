//! Stable exit codes for `dir-iterator` commands.

use crate::core::types::IterationState;

/// Command succeeded or an item was returned.
pub const OK: i32 = 0;
/// Invalid directory, bad config, or any other failure.
pub const INVALID: i32 = 1;
/// Every eligible file is already processed.
pub const COMPLETE: i32 = 2;
/// Every remaining file failed to load during the invocation.
pub const EXHAUSTED: i32 = 3;
/// The directory holds no eligible files.
pub const EMPTY: i32 = 4;

/// Exit code reported for an invocation that ended in `state`.
pub fn for_state(state: IterationState) -> i32 {
    match state {
        IterationState::Advancing => OK,
        IterationState::Invalid => INVALID,
        IterationState::AllProcessed => COMPLETE,
        IterationState::Exhausted => EXHAUSTED,
        IterationState::Empty => EMPTY,
    }
}
