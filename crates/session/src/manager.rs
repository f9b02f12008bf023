//! Tab and pane lifecycle management.
//!
//! `SessionManager` owns the tab list, id generation, focus tracking, and
//! the pane↔process bindings. It is single-owner state: one logical thread
//! issues operations serially, with PTY events delivered over a channel
//! and applied through [`SessionManager::route_event`] on that same
//! thread. All tree mutations go through the copy-on-write operations in
//! the `layout` crate, so a renderer holding the previous root never sees
//! a half-edited tree.
//!
//! Caller errors (unknown ids, closing a tab's last pane) are no-ops by
//! contract, never panics or partial mutations. Process failures surface
//! as pane-level state, never as manager-level errors.

use std::sync::Arc;
use std::time::Duration;

use collections::FxHashMap;
use layout::{PaneId, SplitDirection};
use pty::{ProcessHandle, PtyBridge, PtyEvent};

use crate::pane::{Pane, ProcessState};
use crate::resize::ResizeDebouncer;
use crate::tab::{Tab, TabId};

/// A bridge event resolved to the pane it belongs to — the form handed to
/// the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutedEvent {
    /// Process output for a pane's rendering surface.
    Output {
        tab: TabId,
        pane: PaneId,
        data: Vec<u8>,
    },
    /// The pane's process ended; the pane now carries the completed marker.
    ProcessExited { tab: TabId, pane: PaneId },
    /// The pane was retitled by its process.
    TitleChanged {
        tab: TabId,
        pane: PaneId,
        title: String,
    },
}

/// Top-level multiplexer state: ordered tabs, focus, id generation, and
/// process bindings.
pub struct SessionManager {
    tabs: Vec<Tab>,
    active_tab: Option<TabId>,
    next_tab_id: u64,
    next_pane_id: u64,
    handle_index: FxHashMap<ProcessHandle, PaneId>,
    bridge: Arc<dyn PtyBridge>,
    resize: ResizeDebouncer,
}

impl SessionManager {
    /// Create an empty manager. `resize_window` is the coalescing window
    /// for [`SessionManager::request_resize`].
    pub fn new(bridge: Arc<dyn PtyBridge>, resize_window: Duration) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab: None,
            next_tab_id: 1,
            next_pane_id: 1,
            handle_index: FxHashMap::default(),
            bridge: bridge.clone(),
            resize: ResizeDebouncer::new(bridge, resize_window),
        }
    }

    pub(crate) fn from_restored(
        tabs: Vec<Tab>,
        active_tab: Option<TabId>,
        next_tab_id: u64,
        next_pane_id: u64,
        bridge: Arc<dyn PtyBridge>,
        resize_window: Duration,
    ) -> Self {
        Self {
            tabs,
            active_tab,
            next_tab_id,
            next_pane_id,
            handle_index: FxHashMap::default(),
            bridge: bridge.clone(),
            resize: ResizeDebouncer::new(bridge, resize_window),
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Tabs in display order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id() == id)
    }

    /// The active tab id. `None` only when no tabs exist.
    pub fn active_tab(&self) -> Option<TabId> {
        self.active_tab
    }

    pub(crate) fn counters(&self) -> (u64, u64) {
        (self.next_tab_id, self.next_pane_id)
    }

    // ------------------------------------------------------------------
    // Tab operations
    // ------------------------------------------------------------------

    /// Create a tab with a single fresh pane and make it active.
    pub fn create_tab(&mut self) -> TabId {
        let (tab_id, tab_title) = self.mint_tab();
        let (pane_id, pane_title) = self.mint_pane();
        let tab = Tab::new(tab_id, tab_title, Pane::new(pane_id, pane_title));
        self.tabs.push(tab);
        self.active_tab = Some(tab_id);
        tracing::debug!("Created {} with {}", tab_id, pane_id);
        tab_id
    }

    /// Close a tab, requesting termination of every process bound to its
    /// panes. No-op if `id` is unknown.
    ///
    /// If the closed tab was active, the tab now occupying the same index
    /// becomes active; if the closed tab was last, the new last tab; if no
    /// tabs remain, none.
    pub fn close_tab(&mut self, id: TabId) {
        let Some(index) = self.tab_index(id) else {
            return;
        };
        let tab = self.tabs.remove(index);
        for pane in tab.panes().values() {
            if let Some(handle) = pane.handle() {
                self.handle_index.remove(&handle);
                self.bridge.terminate(handle);
            }
            self.resize.cancel(pane.id());
        }
        if self.active_tab == Some(id) {
            self.active_tab = reassign_active_after_close(&self.tabs, index);
        }
        tracing::debug!("Closed {} ({} panes)", id, tab.pane_count());
    }

    /// Make `id` the active tab. No-op if unknown.
    pub fn set_active_tab(&mut self, id: TabId) {
        if self.tab_index(id).is_some() {
            self.active_tab = Some(id);
        }
    }

    /// Cycle to the next tab in display order.
    pub fn next_tab(&mut self) {
        self.cycle_tab(1);
    }

    /// Cycle to the previous tab in display order.
    pub fn prev_tab(&mut self) {
        self.cycle_tab(-1);
    }

    /// Set a tab's display title. No-op if unknown.
    pub fn rename_tab(&mut self, id: TabId, title: impl Into<String>) {
        if let Some(index) = self.tab_index(id) {
            self.tabs[index].set_title(title.into());
        }
    }

    // ------------------------------------------------------------------
    // Pane operations
    // ------------------------------------------------------------------

    /// Split the pane `pane` in tab `tab`, putting a fresh pane in the
    /// second slot and focusing it. Returns the new pane's id, or `None`
    /// if the tab or pane does not exist (no-op).
    pub fn split_pane(
        &mut self,
        tab: TabId,
        pane: PaneId,
        direction: SplitDirection,
    ) -> Option<PaneId> {
        let index = self.tab_index(tab)?;
        if !self.tabs[index].root().contains_leaf(pane) {
            return None;
        }
        let (new_id, title) = self.mint_pane();
        let tab = &mut self.tabs[index];
        let Some(new_root) = tab.root().split(pane, direction, new_id) else {
            // contains_leaf held just above; the tree cannot have changed.
            util::debug_panic!("split target {} vanished from {}", pane, tab.id());
            return None;
        };
        tab.set_root(new_root);
        tab.insert_pane(Pane::new(new_id, title));
        tab.set_active_pane(new_id);
        tracing::debug!("Split {} in {}; new pane {}", pane, tab.id(), new_id);
        Some(new_id)
    }

    /// Close a pane, terminating its process. No-op if the tab or pane is
    /// unknown, or if the pane is the tab's only one (close the tab
    /// instead). If the closed pane was focused, focus moves to the new
    /// tree's first leaf.
    pub fn close_pane(&mut self, tab: TabId, pane: PaneId) {
        let Some(index) = self.tab_index(tab) else {
            return;
        };
        let tab = &mut self.tabs[index];
        if tab.pane_count() <= 1 {
            tracing::trace!("Refusing to close the last pane of {}", tab.id());
            return;
        }
        let Some(new_root) = tab.root().remove_leaf(pane) else {
            return;
        };
        tab.set_root(new_root);
        let removed = tab.remove_pane(pane);
        if removed.is_none() {
            util::debug_panic!("{} was in the tree but not the registry", pane);
        }
        if tab.active_pane() == pane {
            tab.set_active_pane(tab.root().first_leaf());
        }
        if let Some(handle) = removed.as_ref().and_then(Pane::handle) {
            self.handle_index.remove(&handle);
            self.bridge.terminate(handle);
        }
        self.resize.cancel(pane);
        tracing::debug!("Closed {}", pane);
    }

    /// Focus a pane within a tab. No-op unless the pane is currently a
    /// leaf of that tab's tree.
    pub fn set_active_pane_in_tab(&mut self, tab: TabId, pane: PaneId) {
        let Some(index) = self.tab_index(tab) else {
            return;
        };
        let tab = &mut self.tabs[index];
        if tab.root().contains_leaf(pane) {
            tab.set_active_pane(pane);
        }
    }

    /// Move focus to the next pane in depth-first order, wrapping.
    pub fn focus_next_pane(&mut self, tab: TabId) {
        self.cycle_pane(tab, 1);
    }

    /// Move focus to the previous pane in depth-first order, wrapping.
    pub fn focus_prev_pane(&mut self, tab: TabId) {
        self.cycle_pane(tab, -1);
    }

    /// Set a pane's display title. No-op if the pane no longer exists.
    pub fn rename_pane(&mut self, pane: PaneId, title: impl Into<String>) {
        let Some(index) = self.tab_index_of_pane(pane) else {
            return;
        };
        if let Some(pane) = self.tabs[index].pane_mut(pane) {
            pane.set_title(title.into());
        }
    }

    // ------------------------------------------------------------------
    // Process binding and routing
    // ------------------------------------------------------------------

    /// Record (`Some`) or clear (`None`) the process handle bound to a
    /// pane, keeping the handle→pane reverse index in sync. No-op if the
    /// pane no longer exists (a close raced the bridge's reply).
    pub fn bind_process(&mut self, pane: PaneId, handle: Option<ProcessHandle>) {
        let Some(index) = self.tab_index_of_pane(pane) else {
            tracing::trace!("bind_process for unknown {}; pane closed?", pane);
            return;
        };
        if let Some(old) = self.tabs[index].pane(pane).and_then(Pane::handle) {
            self.handle_index.remove(&old);
        }
        if let Some(pane_ref) = self.tabs[index].pane_mut(pane) {
            match handle {
                Some(handle) => {
                    pane_ref.set_process(ProcessState::Bound(handle));
                    self.handle_index.insert(handle, pane);
                }
                None => pane_ref.set_process(ProcessState::Unbound),
            }
        }
    }

    /// Ask the bridge for a fresh process and bind it to `pane`.
    ///
    /// Returns the handle, or `None` on any failure: an unknown pane, a
    /// pane that is already bound, or a spawn error. Spawn errors are
    /// recorded on the pane as [`ProcessState::Failed`] — the pane stays
    /// open and the failure is never propagated as a manager error.
    pub fn spawn_for_pane(&mut self, pane: PaneId, cols: u16, rows: u16) -> Option<ProcessHandle> {
        let index = self.tab_index_of_pane(pane)?;
        if self.tabs[index].pane(pane).and_then(Pane::handle).is_some() {
            tracing::warn!("{} is already bound; ignoring spawn request", pane);
            return None;
        }
        match self.bridge.create_process(cols, rows) {
            Ok(handle) => {
                self.bind_process(pane, Some(handle));
                Some(handle)
            }
            Err(e) => {
                tracing::warn!("Spawn for {} failed: {:#}", pane, e);
                if let Some(pane_ref) = self.tabs[index].pane_mut(pane) {
                    pane_ref.set_process(ProcessState::Failed(format!("{e:#}")));
                }
                None
            }
        }
    }

    /// Forward input bytes to the pane's process. No-op if the pane is
    /// gone or unbound.
    pub fn write_input(&self, pane: PaneId, data: &[u8]) {
        let Some(handle) = self.pane_handle(pane) else {
            tracing::trace!("Dropping input for unbound {}", pane);
            return;
        };
        self.bridge.write(handle, data);
    }

    /// Request a resize of the pane's process, coalesced through the
    /// per-pane debounce window. Must be called from within a tokio
    /// runtime. No-op if the pane is gone or unbound.
    pub fn request_resize(&self, pane: PaneId, cols: u16, rows: u16) {
        let Some(handle) = self.pane_handle(pane) else {
            return;
        };
        self.resize.request(pane, handle, cols, rows);
    }

    /// Resolve a bridge event to its owning pane.
    ///
    /// Returns `None` for stale handles (the pane was closed or rebound;
    /// interest in the old handle's events ended there). Exit events clear
    /// the binding and leave the pane in place with the completed marker —
    /// removal requires an explicit [`SessionManager::close_pane`].
    pub fn route_event(&mut self, event: PtyEvent) -> Option<RoutedEvent> {
        let handle = event.handle();
        let Some(&pane) = self.handle_index.get(&handle) else {
            tracing::trace!("Ignoring event for stale handle {}", handle);
            return None;
        };
        let Some(index) = self.tab_index_of_pane(pane) else {
            util::debug_panic!("handle index maps {} to missing {}", handle, pane);
            self.handle_index.remove(&handle);
            return None;
        };
        let tab_id = self.tabs[index].id();
        match event {
            PtyEvent::Output { data, .. } => Some(RoutedEvent::Output {
                tab: tab_id,
                pane,
                data,
            }),
            PtyEvent::Exited { .. } => {
                self.handle_index.remove(&handle);
                if let Some(pane_ref) = self.tabs[index].pane_mut(pane) {
                    pane_ref.set_process(ProcessState::Exited);
                }
                self.resize.cancel(pane);
                tracing::debug!("Process for {} exited", pane);
                Some(RoutedEvent::ProcessExited { tab: tab_id, pane })
            }
            PtyEvent::TitleChanged { title, .. } => {
                if let Some(pane_ref) = self.tabs[index].pane_mut(pane) {
                    pane_ref.set_title(title.clone());
                }
                Some(RoutedEvent::TitleChanged {
                    tab: tab_id,
                    pane,
                    title,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Consistency
    // ------------------------------------------------------------------

    /// Check every structural invariant. Used on snapshot restore and in
    /// tests; a healthy manager can never fail this.
    pub fn validate(&self) -> anyhow::Result<()> {
        use anyhow::{bail, ensure};
        use collections::FxHashSet;

        match self.active_tab {
            None => ensure!(
                self.tabs.is_empty(),
                "no active tab but {} tabs exist",
                self.tabs.len()
            ),
            Some(id) => ensure!(self.tab_index(id).is_some(), "active {} does not exist", id),
        }

        let mut seen_tabs: FxHashSet<TabId> = FxHashSet::default();
        let mut seen_panes: FxHashSet<PaneId> = FxHashSet::default();
        for tab in &self.tabs {
            ensure!(seen_tabs.insert(tab.id()), "duplicate {}", tab.id());
            ensure!(
                tab.id().0 < self.next_tab_id,
                "{} not below the tab counter {}",
                tab.id(),
                self.next_tab_id
            );

            let leaves = tab.root().leaf_ids();
            let leaf_set: FxHashSet<PaneId> = leaves.iter().copied().collect();
            ensure!(
                leaf_set.len() == leaves.len(),
                "duplicate leaf ids in {}",
                tab.id()
            );
            let key_set: FxHashSet<PaneId> = tab.panes().keys().copied().collect();
            ensure!(
                leaf_set == key_set,
                "tree leaves and registry keys disagree in {}",
                tab.id()
            );
            ensure!(
                tab.root().contains_leaf(tab.active_pane()),
                "active {} is not a leaf of {}",
                tab.active_pane(),
                tab.id()
            );
            for id in leaves {
                ensure!(seen_panes.insert(id), "{} appears in more than one tab", id);
                ensure!(
                    id.0 < self.next_pane_id,
                    "{} not below the pane counter {}",
                    id,
                    self.next_pane_id
                );
            }
            for pane in tab.panes().values() {
                if let Some(handle) = pane.handle() {
                    ensure!(
                        self.handle_index.get(&handle) == Some(&pane.id()),
                        "bound {} missing from the handle index",
                        pane.id()
                    );
                }
            }
        }

        for (handle, pane_id) in &self.handle_index {
            let pane = self.tabs.iter().find_map(|tab| tab.pane(*pane_id));
            match pane {
                Some(pane) if pane.handle() == Some(*handle) => {}
                _ => bail!("handle index entry {} → {} is stale", handle, pane_id),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn mint_tab(&mut self) -> (TabId, String) {
        let n = self.next_tab_id;
        self.next_tab_id += 1;
        (TabId(n), format!("Terminal {}", n))
    }

    fn mint_pane(&mut self) -> (PaneId, String) {
        let n = self.next_pane_id;
        self.next_pane_id += 1;
        (PaneId(n), format!("Pane {}", n))
    }

    fn tab_index(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id() == id)
    }

    fn tab_index_of_pane(&self, pane: PaneId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.pane(pane).is_some())
    }

    fn pane_handle(&self, pane: PaneId) -> Option<ProcessHandle> {
        self.tabs
            .iter()
            .find_map(|tab| tab.pane(pane))
            .and_then(Pane::handle)
    }

    fn cycle_tab(&mut self, step: isize) {
        let Some(active) = self.active_tab else {
            return;
        };
        let Some(index) = self.tab_index(active) else {
            return;
        };
        let len = self.tabs.len() as isize;
        let next = (index as isize + step).rem_euclid(len) as usize;
        self.active_tab = Some(self.tabs[next].id());
    }

    fn cycle_pane(&mut self, tab: TabId, step: isize) {
        let Some(index) = self.tab_index(tab) else {
            return;
        };
        let tab = &mut self.tabs[index];
        let leaves = tab.root().leaf_ids();
        let Some(position) = leaves.iter().position(|id| *id == tab.active_pane()) else {
            util::debug_panic!("active {} is not a leaf of {}", tab.active_pane(), tab.id());
            return;
        };
        let len = leaves.len() as isize;
        let next = (position as isize + step).rem_euclid(len) as usize;
        tab.set_active_pane(leaves[next]);
    }
}

/// Active-tab reassignment after a close, as a pure function of the list
/// *after* removal: prefer the tab now at the closed tab's index, else the
/// new last tab, else none.
fn reassign_active_after_close(tabs: &[Tab], removed_index: usize) -> Option<TabId> {
    tabs.get(removed_index).or_else(|| tabs.last()).map(Tab::id)
}
