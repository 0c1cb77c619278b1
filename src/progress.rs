//! Progress tracking for archive extraction.
//!
//! Extraction is sequential, so progress is a plain `(total, index)` pair
//! handed to a caller-supplied callback once an entry has been fully written.

/// Progress callback function type: `(total_entries, current_index)`.
pub type ProgressCallback<'a> = dyn FnMut(usize, usize) + 'a;

/// Forwards per-entry progress to an optional callback.
///
/// When no callback is installed every method is a no-op.
pub struct ProgressTracker<'a> {
    total_entries: usize,
    callback: Option<&'a mut ProgressCallback<'a>>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total_entries: usize, callback: Option<&'a mut ProgressCallback<'a>>) -> Self {
        Self { total_entries, callback }
    }

    /// An archive without entries still reports once, as `(0, 0)`.
    pub fn report_empty(&mut self) {
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(0, 0);
        }
    }

    /// Record that the entry at `index` (0-based, container order) is done.
    pub fn record_entry(&mut self, index: usize) {
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(self.total_entries, index);
        }
    }
}
