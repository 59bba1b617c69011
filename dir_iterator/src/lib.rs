//! Incremental directory iteration engine.
//!
//! Hands a host exactly one new eligible file per invocation, persisting which
//! files have been consumed so progress survives restarts. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (progress diff, storage keys,
//!   status lines). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (directory scans, progress records,
//!   image decoding, config) behind traits so tests can substitute fakes.
//!
//! [`iterate`] coordinates core logic with I/O for a single invocation;
//! [`looping`] and [`trigger`] model the host that re-invokes it every cycle.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod iterate;
pub mod logging;
pub mod looping;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod trigger;
