//! Typed navigation routes.
//!
//! The client's chrome navigates by hash path; collaborators receive a
//! typed [`Route`] and derive the path themselves instead of mutating a
//! shared location string.

use serde::{Deserialize, Serialize};

use crate::models::{AccountId, ServiceId};

/// A navigable destination in the client chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// The delete-account confirmation flow.
    DeleteAccount(AccountId),
    /// The delete-service confirmation flow.
    DeleteService(AccountId, ServiceId),
    /// Settings page for one account.
    AccountSettings(AccountId),
    /// The add-service wizard for one account.
    AddServiceWizard(AccountId),
}

impl Route {
    /// Hash path understood by the chrome router.
    #[must_use]
    pub fn hash_path(&self) -> String {
        match self {
            Self::DeleteAccount(account_id) => format!("/account_delete/{account_id}"),
            Self::DeleteService(account_id, service_id) => {
                format!("/account_service_delete/{account_id}/{service_id}")
            }
            Self::AccountSettings(account_id) => format!("/settings/accounts/{account_id}"),
            Self::AddServiceWizard(account_id) => format!("/account_wizard/add/{account_id}"),
        }
    }

    /// Stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeleteAccount(_) => "delete_account",
            Self::DeleteService(..) => "delete_service",
            Self::AccountSettings(_) => "account_settings",
            Self::AddServiceWizard(_) => "add_service_wizard",
        }
    }
}
