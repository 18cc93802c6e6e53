//! Derived view-state snapshots for the context menu.
//!
//! The menu never reads store state ad hoc during rendering; it holds one
//! [`AccountSnapshot`] and one [`EntitlementSnapshot`], recomputed whole on
//! every store broadcast or target change. Projection is total: ids that no
//! longer resolve degrade to defined defaults instead of failing.

use maildock_core::store::{AccountState, UserState};
use maildock_core::{AccountId, ServiceId, ServiceKind, UiLocation};

/// Placeholder display name when nothing resolves.
pub const UNTITLED: &str = "Untitled";

// ──────────────────────────────────────────────────────────────────────
// MenuTarget — what the menu is attached to
// ──────────────────────────────────────────────────────────────────────

/// Identity pair the menu projects state for. Replaced atomically via
/// [`crate::AccountContextMenu::set_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTarget {
    pub account_id: AccountId,
    pub service_id: Option<ServiceId>,
}

impl MenuTarget {
    /// Target a whole account.
    #[must_use]
    pub fn account(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            service_id: None,
        }
    }

    /// Target one service within an account.
    #[must_use]
    pub fn service(account_id: impl Into<AccountId>, service_id: impl Into<ServiceId>) -> Self {
        Self {
            account_id: account_id.into(),
            service_id: Some(service_id.into()),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────
// Snapshots
// ──────────────────────────────────────────────────────────────────────

/// Projection of the targeted service, present only when the target names
/// a service that still resolves. A stale service id projects as `None`,
/// which renders exactly like an account-only target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSnapshot {
    pub id: ServiceId,
    pub display_name: String,
    pub kind: ServiceKind,
    pub sleeping: bool,
    pub active: bool,
    pub auth_invalid: bool,
    pub supports_reauth: bool,
    pub url: String,
    pub ui_location: UiLocation,
}

/// Projection of the targeted account plus its optional service.
///
/// Every field rendering reads has a defined value even when the account
/// id no longer resolves (`account_resolved == false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_resolved: bool,
    pub display_name: String,
    pub service_count: usize,
    pub has_multiple_services: bool,
    pub persists_cookies: bool,
    pub collapse_first_sidebar_service: bool,
    pub service: Option<ServiceSnapshot>,
}

impl Default for AccountSnapshot {
    fn default() -> Self {
        Self {
            account_resolved: false,
            display_name: UNTITLED.to_string(),
            service_count: 0,
            has_multiple_services: false,
            persists_cookies: false,
            collapse_first_sidebar_service: false,
            service: None,
        }
    }
}

impl AccountSnapshot {
    /// Project the current account state for a target. Deterministic and
    /// side-effect free; callable eagerly at attach and reactively on
    /// every broadcast.
    #[must_use]
    pub fn project(target: &MenuTarget, state: &AccountState) -> Self {
        let Some(account) = state.account(&target.account_id) else {
            return Self::default();
        };

        let service = target.service_id.as_ref().and_then(|service_id| {
            state.service(service_id).map(|service| ServiceSnapshot {
                id: service_id.clone(),
                display_name: state
                    .resolved_service_display_name(service_id)
                    .unwrap_or_else(|| UNTITLED.to_string()),
                kind: service.kind,
                sleeping: state.is_service_sleeping(service_id),
                active: state.is_service_active(service_id),
                auth_invalid: state.is_auth_invalid(service_id),
                supports_reauth: service.supports_reauth,
                url: service.url.clone(),
                ui_location: account.ui_location_of(service_id),
            })
        });

        Self {
            account_resolved: true,
            display_name: state
                .resolved_account_display_name(&target.account_id)
                .unwrap_or_else(|| UNTITLED.to_string()),
            service_count: account.service_count(),
            has_multiple_services: account.has_multiple_services(),
            persists_cookies: account.persists_cookies,
            collapse_first_sidebar_service: account.collapse_first_sidebar_service,
            service,
        }
    }
}

/// Projection of the user's entitlement flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntitlementSnapshot {
    pub has_sleep_entitlement: bool,
}

impl EntitlementSnapshot {
    #[must_use]
    pub const fn project(state: &UserState) -> Self {
        Self {
            has_sleep_entitlement: state.has_sleep_entitlement,
        }
    }
}
