//! Progress notification port
//!
//! Defines the interface for reporting progress while an orchestration runs.

use crosscheck_domain::Phase;

/// Callback for progress updates during orchestration
///
/// Implementations live in the presentation layer.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize);

    /// Called when a task completes within a phase
    fn on_task_complete(&self, phase: &Phase, backend: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &Phase);

    /// Called when the primary call moves to the next fallback candidate
    fn on_fallback(&self, _from: &str, _to: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &Phase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &Phase, _backend: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: &Phase) {}
}
