//! Console UI components for MailDock
//!
//! The centerpiece is [`AccountContextMenu`], the transient contextual
//! action menu attached to an account or one of its services. It projects
//! view state from the shared stores, gates rendering behind a debounced
//! visibility lifecycle, and dispatches exactly one command per activated
//! entry through the host's [`maildock_core::CommandBus`].

#![forbid(unsafe_code)]

pub mod context_menu;
pub mod entries;
pub mod snapshot;
pub mod widget;

// Re-export key types for convenience
pub use context_menu::{
    AccountContextMenu, CLOSE_DISPATCH_DELAY, CLOSE_LINGER, MenuPhase, MenuReaction, RELOAD_GRACE,
};
pub use entries::{Emphasis, MenuActionId, MenuEntry, MenuIcon, compose_entries};
pub use snapshot::{AccountSnapshot, EntitlementSnapshot, MenuTarget, ServiceSnapshot, UNTITLED};
pub use widget::{ContextMenuWidget, MenuAnchor};
