//! Account configuration reducers.
//!
//! A reducer is a pure transform over an [`Account`]'s persisted
//! configuration. The menu (and any other caller) never edits location
//! assignments directly; it ships an [`AccountReducer`] through the command
//! bus and the store applies it.

use serde::{Deserialize, Serialize};

use crate::models::{Account, ServiceId, UiLocation};

/// A pure transform applied to an account's persisted configuration.
///
/// Reducers referencing a service id the account does not contain are
/// no-ops; the account is returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum AccountReducer {
    /// Move one service's shortcut to the given location.
    MoveServiceTo {
        service_id: ServiceId,
        location: UiLocation,
    },
    /// Move every service's shortcut to the given location.
    MoveAllServicesTo { location: UiLocation },
    /// Show or hide the first sidebar service shortcut.
    SetCollapseFirstSidebarService { collapsed: bool },
}

impl AccountReducer {
    /// Apply this reducer to the account, in place.
    pub fn apply(&self, account: &mut Account) {
        match self {
            Self::MoveServiceTo {
                service_id,
                location,
            } => {
                if account.service_ids.contains(service_id) {
                    account.ui_locations.insert(service_id.clone(), *location);
                }
            }
            Self::MoveAllServicesTo { location } => {
                for service_id in &account.service_ids {
                    account.ui_locations.insert(service_id.clone(), *location);
                }
            }
            Self::SetCollapseFirstSidebarService { collapsed } => {
                account.collapse_first_sidebar_service = *collapsed;
            }
        }
    }

    /// Stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveServiceTo { .. } => "move_service_to",
            Self::MoveAllServicesTo { .. } => "move_all_services_to",
            Self::SetCollapseFirstSidebarService { .. } => "set_collapse_first_sidebar_service",
        }
    }
}
