//! Item loader abstraction.
//!
//! The [`ItemLoader`] trait decouples the iteration engine from how a file
//! becomes an in-memory payload. Tests use scripted loaders that never decode
//! anything.

use std::path::Path;

/// Turns a candidate path into a payload.
///
/// Implementations must not panic or propagate errors: every failure is
/// reported as `None`, and any resources acquired for the attempt are released
/// before returning.
pub trait ItemLoader {
    /// Payload plus any secondary channel produced for one file.
    type Item;

    fn load(&self, path: &Path) -> Option<Self::Item>;
}
