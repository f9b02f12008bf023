//! A pane: one terminal slot in a tab's layout.

use layout::PaneId;
use pty::ProcessHandle;

/// Lifecycle of the process behind a pane.
///
/// `Unbound → Bound → Exited` (or back to `Unbound` on explicit unbind);
/// a pane re-enters `Bound` only by being remounted and spawning a fresh
/// process, e.g. after session restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// No process yet (just created, restored, or explicitly unbound).
    Unbound,
    /// Live process; I/O is routed through this handle.
    Bound(ProcessHandle),
    /// The process ended. The pane stays visible with a completed marker
    /// until the user closes it explicitly.
    Exited,
    /// Spawning failed; the reason is shown inline in the pane.
    Failed(String),
}

impl ProcessState {
    /// The live handle, if any.
    pub fn handle(&self) -> Option<ProcessHandle> {
        match self {
            Self::Bound(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// A single terminal pane. Owned by exactly one tab's registry; referenced
/// from the tab's layout tree by id.
#[derive(Clone, Debug, PartialEq)]
pub struct Pane {
    id: PaneId,
    title: String,
    process: ProcessState,
}

impl Pane {
    pub(crate) fn new(id: PaneId, title: String) -> Self {
        Self {
            id,
            title,
            process: ProcessState::Unbound,
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current process binding state.
    pub fn process(&self) -> &ProcessState {
        &self.process
    }

    /// The pane's live process handle, if bound.
    pub fn handle(&self) -> Option<ProcessHandle> {
        self.process.handle()
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_process(&mut self, state: ProcessState) {
        self.process = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pane_starts_unbound() {
        let pane = Pane::new(PaneId(1), "Pane 1".into());
        assert_eq!(*pane.process(), ProcessState::Unbound);
        assert!(pane.handle().is_none());
    }

    #[test]
    fn only_bound_state_exposes_a_handle() {
        let handle = ProcessHandle::new();
        assert_eq!(ProcessState::Bound(handle).handle(), Some(handle));
        assert_eq!(ProcessState::Unbound.handle(), None);
        assert_eq!(ProcessState::Exited.handle(), None);
        assert_eq!(ProcessState::Failed("nope".into()).handle(), None);
    }
}
