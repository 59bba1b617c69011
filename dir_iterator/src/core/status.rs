//! Human-readable status lines returned alongside every result.

pub const INVALID_DIRECTORY: &str = "Invalid directory path";
pub const NO_ELIGIBLE_FILES: &str = "No images found in directory";

pub fn all_processed(processed: usize) -> String {
    format!("All images processed. Processed {processed} total images.")
}

pub fn advancing(file_name: &str, processed: usize, total: usize) -> String {
    let remaining = total.saturating_sub(processed);
    format!("Processing: {file_name} ({processed}/{total} processed, {remaining} remaining)")
}

pub fn exhausted(processed: usize, total: usize) -> String {
    format!("All remaining images failed to load. Processed {processed}/{total} images.")
}
