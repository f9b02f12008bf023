//! Native PTY hosting on `portable-pty`.

use anyhow::{Context, Result};
use collections::FxHashMap;
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, PtyPair, PtySize};
use std::io::{Read, Write};
use std::thread;
use tokio::sync::mpsc::UnboundedSender;

use crate::bridge::{ProcessHandle, PtyBridge, PtyEvent};
use settings::constants::{process, terminal};

/// One live PTY child process and its control endpoints.
struct PtyProcess {
    pair: PtyPair,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

/// Production [`PtyBridge`] backed by the host's native PTY system.
///
/// Spawns one shell per `create_process` call and a dedicated reader
/// thread per process. Output and exit notifications are pushed to the
/// event channel supplied at construction; the reader thread sends the
/// single `Exited` event for its handle on EOF, which covers both natural
/// exit and kill-initiated teardown.
pub struct NativePtyBridge {
    shell: String,
    term: String,
    events: UnboundedSender<PtyEvent>,
    processes: Mutex<FxHashMap<ProcessHandle, PtyProcess>>,
}

impl NativePtyBridge {
    /// Create a bridge using the configured shell and `TERM`.
    pub fn new(config: &settings::Config, events: UnboundedSender<PtyEvent>) -> Self {
        Self {
            shell: config.resolve_shell(),
            term: config.term.clone(),
            events,
            processes: Mutex::new(FxHashMap::default()),
        }
    }

    fn pty_size(cols: u16, rows: u16) -> PtySize {
        PtySize {
            rows: rows.max(terminal::MIN_DIMENSION),
            cols: cols.max(terminal::MIN_DIMENSION),
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl PtyBridge for NativePtyBridge {
    fn create_process(&self, cols: u16, rows: u16) -> Result<ProcessHandle> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(Self::pty_size(cols, rows))
            .context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(&self.shell);
        cmd.env("TERM", &self.term);

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn shell '{}'", self.shell))?;

        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")?;

        let mut reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")?;

        let handle = ProcessHandle::new();
        let events = self.events.clone();

        thread::Builder::new()
            .name(format!("pty-reader-{handle}"))
            .spawn(move || {
                let mut buf = [0u8; process::READ_BUFFER_SIZE];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) | Err(_) => {
                            // EOF or read failure - the process is gone.
                            let _ = events.send(PtyEvent::Exited { handle });
                            break;
                        }
                        Ok(n) => {
                            let event = PtyEvent::Output {
                                handle,
                                data: buf[..n].to_vec(),
                            };
                            if events.send(event).is_err() {
                                break; // Channel closed
                            }
                        }
                    }
                }
            })
            .context("Failed to spawn PTY reader thread")?;

        self.processes.lock().insert(
            handle,
            PtyProcess {
                pair,
                writer,
                child,
            },
        );

        tracing::info!("Spawned '{}' as {}", self.shell, handle);
        Ok(handle)
    }

    fn write(&self, handle: ProcessHandle, data: &[u8]) {
        let mut processes = self.processes.lock();
        let Some(process) = processes.get_mut(&handle) else {
            tracing::trace!("Dropping write to stale handle {}", handle);
            return;
        };
        if let Err(e) = process
            .writer
            .write_all(data)
            .and_then(|_| process.writer.flush())
        {
            // The process likely exited mid-write; the reader thread will
            // deliver the Exited event.
            tracing::debug!("Write to {} failed: {}", handle, e);
        }
    }

    fn resize(&self, handle: ProcessHandle, cols: u16, rows: u16) {
        let processes = self.processes.lock();
        let Some(process) = processes.get(&handle) else {
            tracing::trace!("Dropping resize for stale handle {}", handle);
            return;
        };
        if let Err(e) = process.pair.master.resize(Self::pty_size(cols, rows)) {
            tracing::debug!("Resize of {} failed: {}", handle, e);
        }
    }

    fn terminate(&self, handle: ProcessHandle) {
        let Some(mut process) = self.processes.lock().remove(&handle) else {
            return;
        };

        // ESRCH (no such process) is expected if already exited.
        if let Err(e) = process.child.kill() {
            tracing::debug!("Kill child process: {}", e);
        }
        // Reap to avoid a zombie.
        if let Err(e) = process.child.wait() {
            tracing::debug!("Wait for child process: {}", e);
        }

        tracing::debug!("Terminated {}", handle);
    }
}

impl Drop for NativePtyBridge {
    fn drop(&mut self) {
        let handles: Vec<ProcessHandle> = self.processes.lock().keys().copied().collect();
        for handle in handles {
            self.terminate(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn test_config() -> settings::Config {
        settings::Config {
            shell: Some("/bin/sh".to_string()),
            ..settings::Config::default()
        }
    }

    fn test_bridge() -> (NativePtyBridge, UnboundedReceiver<PtyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (NativePtyBridge::new(&test_config(), tx), rx)
    }

    async fn collect_output_until(
        rx: &mut UnboundedReceiver<PtyEvent>,
        marker: &str,
    ) -> String {
        let mut text = String::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !text.contains(marker) {
            let event = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .expect("timed out waiting for PTY output")
                .expect("event channel closed");
            if let PtyEvent::Output { data, .. } = event {
                text.push_str(&String::from_utf8_lossy(&data));
            }
        }
        text
    }

    #[tokio::test]
    #[serial]
    async fn spawns_shell_and_streams_output() {
        let (bridge, mut rx) = test_bridge();
        let handle = bridge.create_process(80, 24).unwrap();

        // Computed marker so the command's own echo can't match.
        bridge.write(handle, b"echo PTY_$((40+2))\n");
        let text = collect_output_until(&mut rx, "PTY_42").await;
        assert!(text.contains("PTY_42"));

        bridge.terminate(handle);
    }

    #[tokio::test]
    #[serial]
    async fn exit_delivers_exited_event() {
        let (bridge, mut rx) = test_bridge();
        let handle = bridge.create_process(80, 24).unwrap();

        bridge.write(handle, b"exit 0\n");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let event = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .expect("timed out waiting for exit")
                .expect("event channel closed");
            if event == (PtyEvent::Exited { handle }) {
                break;
            }
        }
    }

    #[tokio::test]
    #[serial]
    async fn terminate_is_idempotent_and_stale_ops_are_noops() {
        let (bridge, _rx) = test_bridge();
        let handle = bridge.create_process(80, 24).unwrap();

        bridge.terminate(handle);
        bridge.terminate(handle);

        // Stale after terminate: none of these may panic or error out.
        bridge.write(handle, b"ignored\n");
        bridge.resize(handle, 100, 30);
    }

    #[tokio::test]
    #[serial]
    async fn resize_live_process_succeeds() {
        let (bridge, _rx) = test_bridge();
        let handle = bridge.create_process(80, 24).unwrap();
        bridge.resize(handle, 132, 43);
        bridge.terminate(handle);
    }

    #[tokio::test]
    #[serial]
    async fn spawn_failure_reports_shell() {
        let config = settings::Config {
            shell: Some("/nonexistent/shell-binary".to_string()),
            ..settings::Config::default()
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        let bridge = NativePtyBridge::new(&config, tx);

        let err = bridge.create_process(80, 24).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/shell-binary"));
    }
}
