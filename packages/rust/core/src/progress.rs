//! Progress callbacks for long-running aggregations.

use steamlib_shared::SteamError;

/// Progress callback for reporting aggregation status.
///
/// Callbacks fire from concurrently running branches, so implementations must
/// tolerate interleaved calls.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a notebook and all its notes are assembled.
    fn notebook_populated(&self, name: &str, note_count: usize);
    /// Called when a single note finishes assembly.
    fn note_assembled(&self, title: &str);
    /// Called when a tag lookup fails; the note is still returned.
    fn tag_failed(&self, note_guid: &str, tag_guid: &str, error: &SteamError);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn notebook_populated(&self, _name: &str, _note_count: usize) {}
    fn note_assembled(&self, _title: &str) {}
    fn tag_failed(&self, _note_guid: &str, _tag_guid: &str, _error: &SteamError) {}
}
