//! Session persistence.
//!
//! The snapshot captures tab order, tree shapes, titles, and the id
//! counters — and deliberately nothing about processes. PIDs are not
//! restartable: a handle serialized by a previous run can never be valid
//! in the next one, so the snapshot types have no slot for one and every
//! restored pane starts `Unbound`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use layout::{LayoutNode, PaneId};
use pty::PtyBridge;
use serde::{Deserialize, Serialize};

use crate::manager::SessionManager;
use crate::pane::Pane;
use crate::tab::{PaneRegistry, Tab, TabId};

/// Persisted pane: identity and title only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    pub id: PaneId,
    pub title: String,
}

/// Persisted tab: tree shape plus its panes in depth-first order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub id: TabId,
    pub title: String,
    pub root: Arc<LayoutNode>,
    pub panes: Vec<PaneSnapshot>,
}

/// Persisted session: ordered tabs, active tab, and the two monotonic id
/// counters (so ids minted after restore never collide with restored ones).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tabs: Vec<TabSnapshot>,
    pub active_tab: Option<TabId>,
    pub next_tab_id: u64,
    pub next_pane_id: u64,
}

impl SessionManager {
    /// Capture persistable state, regardless of current binding state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let tabs = self
            .tabs()
            .iter()
            .map(|tab| TabSnapshot {
                id: tab.id(),
                title: tab.title().to_string(),
                root: tab.root().clone(),
                panes: tab
                    .root()
                    .leaf_ids()
                    .into_iter()
                    .map(|id| PaneSnapshot {
                        id,
                        title: tab
                            .pane(id)
                            .map(|pane| pane.title().to_string())
                            .unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();
        let (next_tab_id, next_pane_id) = self.counters();
        SessionSnapshot {
            tabs,
            active_tab: self.active_tab(),
            next_tab_id,
            next_pane_id,
        }
    }

    /// Rebuild a manager from a snapshot.
    ///
    /// Tree shapes, pane identities, and titles come back verbatim; every
    /// pane starts `Unbound` and each tab focuses its first leaf. A
    /// snapshot that violates the structural invariants (hand-edited or
    /// truncated file) is rejected rather than repaired.
    pub fn restore(
        snapshot: SessionSnapshot,
        bridge: Arc<dyn PtyBridge>,
        resize_window: Duration,
    ) -> Result<Self> {
        let tabs: Vec<Tab> = snapshot
            .tabs
            .into_iter()
            .map(|tab| {
                let mut panes = PaneRegistry::default();
                for pane in tab.panes {
                    panes.insert(pane.id, Pane::new(pane.id, pane.title));
                }
                Tab::from_parts(tab.id, tab.title, tab.root, panes)
            })
            .collect();

        let manager = SessionManager::from_restored(
            tabs,
            snapshot.active_tab,
            snapshot.next_tab_id,
            snapshot.next_pane_id,
            bridge,
            resize_window,
        );
        manager
            .validate()
            .context("Rejecting invalid session snapshot")?;
        tracing::info!("Restored session with {} tab(s)", manager.tabs().len());
        Ok(manager)
    }
}

/// Write a snapshot as JSON, creating parent directories as needed.
pub fn save(snapshot: &SessionSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create session directory {:?}", parent))?;
    }
    let json =
        serde_json::to_string_pretty(snapshot).context("Failed to serialize session snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session snapshot to {:?}", path))?;
    tracing::debug!("Saved session snapshot to {:?}", path);
    Ok(())
}

/// Load a snapshot. Returns `None` on any error — a missing or damaged
/// session file means starting fresh, never failing startup.
pub fn load(path: &Path) -> Option<SessionSnapshot> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read session snapshot: {}", e);
            }
            return None;
        }
    };

    // Size guard
    if content.len() > settings::constants::persist::MAX_FILE_SIZE as usize {
        tracing::warn!(
            "Session snapshot too large ({} bytes), starting fresh",
            content.len()
        );
        return None;
    }

    match serde_json::from_str(&content) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!("Failed to parse session snapshot: {}", e);
            None
        }
    }
}
