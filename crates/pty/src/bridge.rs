//! The bridge contract between the session core and PTY hosting.

use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a running PTY process.
///
/// Minted by a bridge implementation when a process is spawned; a handle
/// from a previous program run (or a terminated process) is stale, and all
/// bridge operations on stale handles are silent no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessHandle(Uuid);

impl ProcessHandle {
    /// Mint a fresh handle. Called by bridge implementations only.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asynchronous notification from a bridge, tagged by process handle.
///
/// `Output` events for one handle arrive in send order; there is no
/// ordering guarantee across handles. `Exited` is delivered at most once
/// per handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PtyEvent {
    /// Raw bytes the process wrote to its terminal.
    Output {
        handle: ProcessHandle,
        data: Vec<u8>,
    },
    /// The process ended (exit or kill).
    Exited { handle: ProcessHandle },
    /// The process retitled its terminal (surfaced by the emulation layer
    /// above the bridge, e.g. from OSC title reports).
    TitleChanged {
        handle: ProcessHandle,
        title: String,
    },
}

impl PtyEvent {
    /// The handle this event is tagged with.
    pub fn handle(&self) -> ProcessHandle {
        match self {
            Self::Output { handle, .. }
            | Self::Exited { handle }
            | Self::TitleChanged { handle, .. } => *handle,
        }
    }
}

/// Host-side PTY operations consumed by the session core.
///
/// All methods are non-blocking requests. Spawning is the only fallible
/// operation; `write`/`resize` no-op on stale handles and `terminate` is
/// idempotent. Implementations deliver [`PtyEvent`]s over a channel
/// supplied at construction.
pub trait PtyBridge: Send + Sync {
    /// Spawn a shell process with the given initial geometry.
    fn create_process(&self, cols: u16, rows: u16) -> anyhow::Result<ProcessHandle>;

    /// Write input bytes to the process. No-op if `handle` is stale.
    fn write(&self, handle: ProcessHandle, data: &[u8]);

    /// Resize the process's terminal. No-op if `handle` is stale.
    fn resize(&self, handle: ProcessHandle, cols: u16, rows: u16);

    /// Request process termination. Idempotent; fire-and-forget.
    fn terminate(&self, handle: ProcessHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let a = ProcessHandle::new();
        let b = ProcessHandle::new();
        assert_ne!(a, b);
    }

    #[test]
    fn event_handle_accessor_covers_all_variants() {
        let handle = ProcessHandle::new();
        let events = [
            PtyEvent::Output {
                handle,
                data: b"hi".to_vec(),
            },
            PtyEvent::Exited { handle },
            PtyEvent::TitleChanged {
                handle,
                title: "vim".into(),
            },
        ];
        for event in events {
            assert_eq!(event.handle(), handle);
        }
    }
}
