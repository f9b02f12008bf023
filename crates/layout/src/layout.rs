//! Split-pane layout tree.
//!
//! A tab's panes are arranged in a binary tree where leaves are panes and
//! internal nodes are splits:
//!
//! ```text
//! Split (Horizontal)
//! ├── Leaf (Pane 1)
//! └── Split (Vertical)
//!     ├── Leaf (Pane 2)
//!     └── Leaf (Pane 3)
//! ```
//!
//! All rewriting operations are pure: they never mutate the receiver and
//! return a fresh root, path-copying only the spine above the edit point
//! and sharing every untouched subtree via `Arc`. A caller holding the old
//! root keeps a fully consistent pre-mutation tree, and `Arc::ptr_eq` on
//! subtrees gives the renderer cheap change detection.
//!
//! Search order is always `first` before `second`; this fixes which leaf
//! `first_leaf` picks and which occurrence wins if ids were ever duplicated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a pane. Minted by the session's monotonic
/// counter; never reused within a process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneId(pub u64);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

/// Direction of a split between two panes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitDirection {
    /// Side-by-side (left | right)
    Horizontal,
    /// Stacked (top / bottom)
    Vertical,
}

/// A layout tree node - either a leaf (one pane) or a split (two children).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutNode {
    Leaf {
        pane: PaneId,
    },
    Split {
        direction: SplitDirection,
        /// Share of the split given to `first` (0.0 to 1.0, exclusive).
        ratio: f32,
        first: Arc<LayoutNode>,
        second: Arc<LayoutNode>,
    },
}

impl LayoutNode {
    /// Create a single-leaf tree.
    pub fn leaf(pane: PaneId) -> Arc<Self> {
        Arc::new(Self::Leaf { pane })
    }

    /// Split the leaf holding `target` into a split node with the original
    /// pane in the `first` slot and `new_pane` in the `second` slot, at an
    /// even 0.5 ratio.
    ///
    /// Returns the new root, or `None` if `target` is not a leaf of this
    /// tree (a caller error; the tree is unchanged either way).
    pub fn split(
        &self,
        target: PaneId,
        direction: SplitDirection,
        new_pane: PaneId,
    ) -> Option<Arc<Self>> {
        match self {
            Self::Leaf { pane } if *pane == target => Some(Arc::new(Self::Split {
                direction,
                ratio: 0.5,
                first: Self::leaf(*pane),
                second: Self::leaf(new_pane),
            })),
            Self::Leaf { .. } => None,
            Self::Split {
                direction: dir,
                ratio,
                first,
                second,
            } => {
                if let Some(new_first) = first.split(target, direction, new_pane) {
                    Some(Arc::new(Self::Split {
                        direction: *dir,
                        ratio: *ratio,
                        first: new_first,
                        second: second.clone(),
                    }))
                } else {
                    second
                        .split(target, direction, new_pane)
                        .map(|new_second| {
                            Arc::new(Self::Split {
                                direction: *dir,
                                ratio: *ratio,
                                first: first.clone(),
                                second: new_second,
                            })
                        })
                }
            }
        }
    }

    /// Remove the leaf holding `target`. The parent split collapses to the
    /// surviving sibling subtree, so no single-child splits are ever left
    /// behind.
    ///
    /// Returns the new root, or `None` if `target` is the tree's only leaf
    /// (callers must close the whole tab instead) or not present.
    pub fn remove_leaf(&self, target: PaneId) -> Option<Arc<Self>> {
        match self {
            Self::Leaf { .. } => None,
            Self::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                if first.is_leaf_for(target) {
                    return Some(second.clone());
                }
                if second.is_leaf_for(target) {
                    return Some(first.clone());
                }
                if let Some(new_first) = first.remove_leaf(target) {
                    Some(Arc::new(Self::Split {
                        direction: *direction,
                        ratio: *ratio,
                        first: new_first,
                        second: second.clone(),
                    }))
                } else {
                    second.remove_leaf(target).map(|new_second| {
                        Arc::new(Self::Split {
                            direction: *direction,
                            ratio: *ratio,
                            first: first.clone(),
                            second: new_second,
                        })
                    })
                }
            }
        }
    }

    /// Number of leaves in the tree. Always ≥ 1.
    pub fn count_leaves(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { first, second, .. } => first.count_leaves() + second.count_leaves(),
        }
    }

    /// The leftmost/depth-first-first leaf. Used to pick a deterministic
    /// focus target after the focused pane is closed.
    pub fn first_leaf(&self) -> PaneId {
        match self {
            Self::Leaf { pane } => *pane,
            Self::Split { first, .. } => first.first_leaf(),
        }
    }

    /// All leaf pane ids in depth-first order (`first` before `second`).
    pub fn leaf_ids(&self) -> Vec<PaneId> {
        fn walk(node: &LayoutNode, out: &mut Vec<PaneId>) {
            match node {
                LayoutNode::Leaf { pane } => out.push(*pane),
                LayoutNode::Split { first, second, .. } => {
                    walk(first, out);
                    walk(second, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Whether `target` appears as a leaf of this tree.
    pub fn contains_leaf(&self, target: PaneId) -> bool {
        match self {
            Self::Leaf { pane } => *pane == target,
            Self::Split { first, second, .. } => {
                first.contains_leaf(target) || second.contains_leaf(target)
            }
        }
    }

    fn is_leaf_for(&self, target: PaneId) -> bool {
        matches!(self, Self::Leaf { pane } if *pane == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_leaf_tree() -> Arc<LayoutNode> {
        LayoutNode::leaf(PaneId(1))
            .split(PaneId(1), SplitDirection::Vertical, PaneId(2))
            .unwrap()
    }

    #[test]
    fn split_replaces_target_leaf() {
        let root = two_leaf_tree();
        match &*root {
            LayoutNode::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                assert_eq!(*direction, SplitDirection::Vertical);
                assert_eq!(*ratio, 0.5);
                assert_eq!(**first, LayoutNode::Leaf { pane: PaneId(1) });
                assert_eq!(**second, LayoutNode::Leaf { pane: PaneId(2) });
            }
            other => panic!("expected split root, got {:?}", other),
        }
    }

    #[test]
    fn split_unknown_target_returns_none() {
        let root = two_leaf_tree();
        assert!(root
            .split(PaneId(99), SplitDirection::Horizontal, PaneId(3))
            .is_none());
    }

    #[test]
    fn split_does_not_mutate_original() {
        let root = two_leaf_tree();
        let _bigger = root
            .split(PaneId(2), SplitDirection::Horizontal, PaneId(3))
            .unwrap();
        assert_eq!(root.count_leaves(), 2);
        assert_eq!(root.leaf_ids(), vec![PaneId(1), PaneId(2)]);
    }

    #[test]
    fn split_shares_untouched_sibling() {
        let root = two_leaf_tree();
        let new_root = root
            .split(PaneId(2), SplitDirection::Horizontal, PaneId(3))
            .unwrap();

        let (old_first, new_first) = match (&*root, &*new_root) {
            (
                LayoutNode::Split { first: a, .. },
                LayoutNode::Split { first: b, .. },
            ) => (a.clone(), b.clone()),
            _ => panic!("expected split roots"),
        };
        // The untouched branch is the same allocation, not a copy.
        assert!(Arc::ptr_eq(&old_first, &new_first));
    }

    #[test]
    fn remove_collapses_split_to_sibling() {
        let root = two_leaf_tree();
        let collapsed = root.remove_leaf(PaneId(2)).unwrap();
        assert_eq!(*collapsed, LayoutNode::Leaf { pane: PaneId(1) });
    }

    #[test]
    fn remove_only_leaf_returns_none() {
        let root = LayoutNode::leaf(PaneId(1));
        assert!(root.remove_leaf(PaneId(1)).is_none());
    }

    #[test]
    fn remove_unknown_returns_none() {
        let root = two_leaf_tree();
        assert!(root.remove_leaf(PaneId(99)).is_none());
    }

    #[test]
    fn remove_deep_leaf_keeps_outer_structure() {
        // ((1 | 2) / 3) , remove 2 -> (1 / 3)
        let root = two_leaf_tree()
            .split(PaneId(1), SplitDirection::Horizontal, PaneId(3))
            .unwrap();
        let pruned = root.remove_leaf(PaneId(3)).unwrap();
        assert_eq!(pruned.leaf_ids(), vec![PaneId(1), PaneId(2)]);
        assert!(matches!(&*pruned, LayoutNode::Split { .. }));
    }

    #[test]
    fn first_leaf_is_depth_first_first() {
        let root = two_leaf_tree()
            .split(PaneId(1), SplitDirection::Horizontal, PaneId(3))
            .unwrap();
        // Tree is ((1 | 3) / 2); leftmost is 1.
        assert_eq!(root.first_leaf(), PaneId(1));
        assert_eq!(root.leaf_ids(), vec![PaneId(1), PaneId(3), PaneId(2)]);
    }

    #[test]
    fn count_leaves_matches_splits() {
        let mut root = LayoutNode::leaf(PaneId(0));
        for n in 1..=5u64 {
            root = root
                .split(PaneId(n - 1), SplitDirection::Vertical, PaneId(n))
                .unwrap();
        }
        assert_eq!(root.count_leaves(), 6);
    }

    #[test]
    fn contains_leaf_finds_all_leaves() {
        let root = two_leaf_tree();
        assert!(root.contains_leaf(PaneId(1)));
        assert!(root.contains_leaf(PaneId(2)));
        assert!(!root.contains_leaf(PaneId(3)));
    }

    #[test]
    fn split_then_remove_round_trips() {
        let root = two_leaf_tree();
        let grown = root
            .split(PaneId(1), SplitDirection::Horizontal, PaneId(7))
            .unwrap();
        let restored = grown.remove_leaf(PaneId(7)).unwrap();
        assert_eq!(*restored, *root);
    }

    #[test]
    fn serde_round_trips_tree_shape() {
        let root = two_leaf_tree()
            .split(PaneId(2), SplitDirection::Horizontal, PaneId(3))
            .unwrap();
        let json = serde_json::to_string(&*root).unwrap();
        let back: LayoutNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, *root);
    }

    /// A random sequence of (target index, direction) pairs. Each op splits
    /// the leaf at `index % leaf_count`, so any sequence is valid.
    fn split_ops() -> impl Strategy<Value = Vec<(usize, SplitDirection)>> {
        prop::collection::vec(
            (
                0usize..64,
                prop_oneof![
                    Just(SplitDirection::Horizontal),
                    Just(SplitDirection::Vertical)
                ],
            ),
            0..12,
        )
    }

    fn build_tree(ops: &[(usize, SplitDirection)]) -> Arc<LayoutNode> {
        let mut root = LayoutNode::leaf(PaneId(0));
        let mut next = 1u64;
        for (index, direction) in ops {
            let leaves = root.leaf_ids();
            let target = leaves[index % leaves.len()];
            root = root.split(target, *direction, PaneId(next)).unwrap();
            next += 1;
        }
        root
    }

    proptest! {
        #[test]
        fn every_split_adds_exactly_one_leaf(ops in split_ops()) {
            let root = build_tree(&ops);
            prop_assert_eq!(root.count_leaves(), ops.len() + 1);
        }

        #[test]
        fn leaf_ids_are_unique(ops in split_ops()) {
            let root = build_tree(&ops);
            let mut ids = root.leaf_ids();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), root.count_leaves());
        }

        #[test]
        fn split_remove_round_trip(
            ops in split_ops(),
            index in 0usize..64,
            direction in prop_oneof![
                Just(SplitDirection::Horizontal),
                Just(SplitDirection::Vertical)
            ],
        ) {
            let root = build_tree(&ops);
            let leaves = root.leaf_ids();
            let target = leaves[index % leaves.len()];
            let added = PaneId(10_000);

            let grown = root.split(target, direction, added).unwrap();
            let restored = grown.remove_leaf(added).unwrap();
            prop_assert_eq!(&*restored, &*root);
        }

        #[test]
        fn remove_drops_exactly_the_target(ops in split_ops(), index in 0usize..64) {
            let root = build_tree(&ops);
            prop_assume!(root.count_leaves() > 1);

            let leaves = root.leaf_ids();
            let target = leaves[index % leaves.len()];
            let pruned = root.remove_leaf(target).unwrap();

            let mut expected = leaves.clone();
            expected.retain(|id| *id != target);
            prop_assert_eq!(pruned.leaf_ids(), expected);
        }
    }
}
