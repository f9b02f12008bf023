//! Terminal multiplexer session core.
//!
//! The model layer between a UI and the PTY bridge: tabs of split-pane
//! layouts, pane↔process bindings, event routing, and persistence.
//! Contains no rendering and no terminal emulation.

mod manager;
mod pane;
pub mod persist;
mod resize;
mod tab;

#[cfg(test)]
mod testing;

pub use layout::{LayoutNode, PaneId, SplitDirection};
pub use manager::{RoutedEvent, SessionManager};
pub use pane::{Pane, ProcessState};
pub use persist::{PaneSnapshot, SessionSnapshot, TabSnapshot};
pub use tab::{PaneRegistry, Tab, TabId};
