//! A tab: one layout tree plus the registry of panes it references.

use std::fmt;
use std::sync::Arc;

use collections::FxHashMap;
use layout::{LayoutNode, PaneId};
use serde::{Deserialize, Serialize};

use crate::pane::Pane;

/// Unique identifier for a tab. Minted by the session's monotonic
/// counter; never reused within a process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Per-tab map from pane id to pane metadata.
///
/// Invariant: the key set equals the set of leaf ids of the tab's layout
/// tree — no orphan panes, no dangling leaf references.
pub type PaneRegistry = FxHashMap<PaneId, Pane>;

/// A top-level tab holding a split layout of panes.
#[derive(Clone, Debug)]
pub struct Tab {
    id: TabId,
    title: String,
    root: Arc<LayoutNode>,
    panes: PaneRegistry,
    active_pane: PaneId,
}

impl Tab {
    /// Create a tab with `pane` as its sole leaf and focus.
    pub(crate) fn new(id: TabId, title: String, pane: Pane) -> Self {
        let pane_id = pane.id();
        let mut panes = PaneRegistry::default();
        panes.insert(pane_id, pane);
        Self {
            id,
            title,
            root: LayoutNode::leaf(pane_id),
            panes,
            active_pane: pane_id,
        }
    }

    /// Reassemble a tab from persisted parts. The caller (persistence
    /// restore) has already validated that `panes` matches the tree's
    /// leaves; focus falls back to the first leaf.
    pub(crate) fn from_parts(
        id: TabId,
        title: String,
        root: Arc<LayoutNode>,
        panes: PaneRegistry,
    ) -> Self {
        let active_pane = root.first_leaf();
        Self {
            id,
            title,
            root,
            panes,
            active_pane,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The tab's layout tree. Cheap to clone; mutations replace the whole
    /// root, so a held reference stays internally consistent.
    pub fn root(&self) -> &Arc<LayoutNode> {
        &self.root
    }

    /// Id of the focused pane. Always a leaf of `root()`.
    pub fn active_pane(&self) -> PaneId {
        self.active_pane
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.get(&id)
    }

    /// The pane registry, keyed by pane id.
    pub fn panes(&self) -> &PaneRegistry {
        &self.panes
    }

    /// Number of panes (== number of leaves in the tree).
    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_root(&mut self, root: Arc<LayoutNode>) {
        self.root = root;
    }

    pub(crate) fn set_active_pane(&mut self, pane: PaneId) {
        self.active_pane = pane;
    }

    pub(crate) fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.get_mut(&id)
    }

    pub(crate) fn insert_pane(&mut self, pane: Pane) {
        self.panes.insert(pane.id(), pane);
    }

    pub(crate) fn remove_pane(&mut self, id: PaneId) -> Option<Pane> {
        self.panes.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tab_has_single_leaf_and_focus() {
        let pane = Pane::new(PaneId(1), "Pane 1".into());
        let tab = Tab::new(TabId(1), "Terminal 1".into(), pane);

        assert_eq!(tab.pane_count(), 1);
        assert_eq!(tab.active_pane(), PaneId(1));
        assert_eq!(tab.root().leaf_ids(), vec![PaneId(1)]);
        assert_eq!(tab.pane(PaneId(1)).unwrap().title(), "Pane 1");
    }

    #[test]
    fn from_parts_focuses_first_leaf() {
        let root = LayoutNode::leaf(PaneId(3))
            .split(PaneId(3), layout::SplitDirection::Vertical, PaneId(4))
            .unwrap();
        let mut panes = PaneRegistry::default();
        panes.insert(PaneId(3), Pane::new(PaneId(3), "a".into()));
        panes.insert(PaneId(4), Pane::new(PaneId(4), "b".into()));

        let tab = Tab::from_parts(TabId(2), "restored".into(), root, panes);
        assert_eq!(tab.active_pane(), PaneId(3));
    }
}
