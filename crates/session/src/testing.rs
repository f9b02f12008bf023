//! In-crate test doubles.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use parking_lot::Mutex;
use pty::{ProcessHandle, PtyBridge};

/// A [`PtyBridge`] that records every call instead of touching the host.
#[derive(Default)]
pub(crate) struct RecordingBridge {
    pub spawned: Mutex<Vec<ProcessHandle>>,
    pub writes: Mutex<Vec<(ProcessHandle, Vec<u8>)>>,
    pub resized: Mutex<Vec<(ProcessHandle, u16, u16)>>,
    pub terminated: Mutex<Vec<ProcessHandle>>,
    pub fail_spawn: AtomicBool,
}

impl RecordingBridge {
    pub fn resizes(&self) -> Vec<(ProcessHandle, u16, u16)> {
        self.resized.lock().clone()
    }

    pub fn terminations(&self) -> Vec<ProcessHandle> {
        self.terminated.lock().clone()
    }

    pub fn set_fail_spawn(&self, fail: bool) {
        self.fail_spawn.store(fail, Ordering::SeqCst);
    }
}

impl PtyBridge for RecordingBridge {
    fn create_process(&self, _cols: u16, _rows: u16) -> anyhow::Result<ProcessHandle> {
        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(anyhow!("no shell available"));
        }
        let handle = ProcessHandle::new();
        self.spawned.lock().push(handle);
        Ok(handle)
    }

    fn write(&self, handle: ProcessHandle, data: &[u8]) {
        self.writes.lock().push((handle, data.to_vec()));
    }

    fn resize(&self, handle: ProcessHandle, cols: u16, rows: u16) {
        self.resized.lock().push((handle, cols, rows));
    }

    fn terminate(&self, handle: ProcessHandle) {
        self.terminated.lock().push(handle);
    }
}
