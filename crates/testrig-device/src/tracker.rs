//! Process-state bookkeeping for one device instance.

use testrig_types::{BundleId, ProcessId};

/// Whether the target app currently has a process started by this engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// No process has been started, or the last one was terminated.
    Unstarted,
    /// A process was cold-launched and has not been terminated since.
    Started {
        pid: ProcessId,
        bundle_id: BundleId,
    },
}

/// Remembers the last successfully started process. Pure bookkeeping; the
/// orchestrator commits a transition only after the corresponding driver
/// call has succeeded.
#[derive(Debug)]
pub struct ProcessTracker {
    state: ProcessState,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self {
            state: ProcessState::Unstarted,
        }
    }

    /// Transition to `Started` after a successful cold launch.
    pub fn record(&mut self, pid: ProcessId, bundle_id: BundleId) {
        self.state = ProcessState::Started { pid, bundle_id };
    }

    /// The current state.
    pub fn current(&self) -> &ProcessState {
        &self.state
    }

    /// Whether a process for `bundle_id` is recorded as running.
    pub fn is_running(&self, bundle_id: &BundleId) -> bool {
        matches!(&self.state, ProcessState::Started { bundle_id: b, .. } if b == bundle_id)
    }

    /// Reset to `Unstarted` after an explicit termination.
    pub fn clear(&mut self) {
        self.state = ProcessState::Unstarted;
    }
}

impl Default for ProcessTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unstarted() {
        let tracker = ProcessTracker::new();
        assert_eq!(*tracker.current(), ProcessState::Unstarted);
        assert!(!tracker.is_running(&BundleId::from("com.example.app")));
    }

    #[test]
    fn record_then_clear_cycles_state() {
        let bundle = BundleId::from("com.example.app");
        let mut tracker = ProcessTracker::new();

        tracker.record(ProcessId(7), bundle.clone());
        assert!(tracker.is_running(&bundle));
        assert_eq!(
            *tracker.current(),
            ProcessState::Started {
                pid: ProcessId(7),
                bundle_id: bundle.clone()
            }
        );

        tracker.clear();
        assert_eq!(*tracker.current(), ProcessState::Unstarted);
    }

    #[test]
    fn is_running_distinguishes_bundles() {
        let mut tracker = ProcessTracker::new();
        tracker.record(ProcessId(1), BundleId::from("com.example.app"));
        assert!(!tracker.is_running(&BundleId::from("com.other.app")));
    }

    #[test]
    fn record_overwrites_previous_process() {
        let bundle = BundleId::from("com.example.app");
        let mut tracker = ProcessTracker::new();
        tracker.record(ProcessId(1), bundle.clone());
        tracker.record(ProcessId(2), bundle.clone());
        assert_eq!(
            *tracker.current(),
            ProcessState::Started {
                pid: ProcessId(2),
                bundle_id: bundle
            }
        );
    }
}
