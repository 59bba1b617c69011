//! Storage key derivation for per-directory progress records.

/// Map a directory path onto the key naming its progress record.
///
/// Path separators and drive colons become `_`. The mapping is lossy: `/a_b`
/// and `/a/b` share a key and therefore a record.
pub fn storage_key(directory: &str) -> String {
    directory.replace(['/', '\\', ':'], "_")
}
