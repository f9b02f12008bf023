//! Debounced resize forwarding.
//!
//! Continuous UI resize interactions fire far faster than a child process
//! wants SIGWINCH. Each pane gets a single-flight cancel-and-reschedule
//! timer: a new request aborts the pane's pending timer and starts a fresh
//! one, so only the newest geometry inside the window reaches the bridge,
//! independently of other panes' resize activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collections::FxHashMap;
use layout::PaneId;
use parking_lot::Mutex;
use pty::{ProcessHandle, PtyBridge};
use tokio::task::AbortHandle;

struct PendingResize {
    seq: u64,
    abort: AbortHandle,
}

pub(crate) struct ResizeDebouncer {
    bridge: Arc<dyn PtyBridge>,
    window: Duration,
    seq: AtomicU64,
    pending: Arc<Mutex<FxHashMap<PaneId, PendingResize>>>,
}

impl ResizeDebouncer {
    pub(crate) fn new(bridge: Arc<dyn PtyBridge>, window: Duration) -> Self {
        Self {
            bridge,
            window,
            seq: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Schedule a resize for `pane`, superseding any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn request(&self, pane: PaneId, handle: ProcessHandle, cols: u16, rows: u16) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let bridge = self.bridge.clone();
        let pending = self.pending.clone();
        let window = self.window;

        let mut map = self.pending.lock();
        if let Some(prev) = map.remove(&pane) {
            prev.abort.abort();
        }

        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Forward only if this timer is still the pane's newest; a
            // raced abort may have landed after our sleep completed.
            let still_current = {
                let mut map = pending.lock();
                match map.get(&pane) {
                    Some(entry) if entry.seq == seq => {
                        map.remove(&pane);
                        true
                    }
                    _ => false,
                }
            };
            if still_current {
                bridge.resize(handle, cols, rows);
            }
        });

        map.insert(
            pane,
            PendingResize {
                seq,
                abort: task.abort_handle(),
            },
        );
    }

    /// Drop any pending resize for `pane` (the pane is closing or its
    /// process is gone).
    pub(crate) fn cancel(&self, pane: PaneId) {
        if let Some(prev) = self.pending.lock().remove(&pane) {
            prev.abort.abort();
        }
    }
}
