//! Command vocabulary and dispatch boundary.
//!
//! Every mutation the UI requests travels through [`CommandBus::dispatch`]
//! as a single [`Command`]. The bus guarantees at-most-one effect per
//! invocation; callers are responsible for issuing each command at most
//! once per gesture.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{AccountId, ServiceId};
use crate::reducers::AccountReducer;
use crate::routes::Route;

// ──────────────────────────────────────────────────────────────────────
// Command — one externally visible effect
// ──────────────────────────────────────────────────────────────────────

/// A single effect requested from the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Navigate the chrome to a route.
    Navigate(Route),
    /// Make a service the active one in its account view.
    SetActiveService(ServiceId),
    /// Reload a service's content view.
    ReloadService(ServiceId),
    /// Full re-sync of every service in an account.
    FullSyncAccount(AccountId),
    /// Full re-sync of a single service.
    FullSyncService(ServiceId),
    /// Drop the account's browser session (cookies et al).
    ClearBrowserSession(AccountId),
    /// Run the provider's reauthentication flow.
    ReauthenticateService(ServiceId),
    /// Wake a sleeping service.
    WakeService(ServiceId),
    /// Put a service to sleep.
    SleepService(ServiceId),
    /// Put every service in the account to sleep.
    SleepAllServices(AccountId),
    /// Apply a configuration reducer to an account.
    ReduceAccount {
        account_id: AccountId,
        reducer: AccountReducer,
    },
    /// Open a service's content in a standalone window.
    OpenContentWindow { service_id: ServiceId, url: String },
}

impl Command {
    /// Stable name for logging and test assertions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::SetActiveService(_) => "set_active_service",
            Self::ReloadService(_) => "reload_service",
            Self::FullSyncAccount(_) => "full_sync_account",
            Self::FullSyncService(_) => "full_sync_service",
            Self::ClearBrowserSession(_) => "clear_browser_session",
            Self::ReauthenticateService(_) => "reauthenticate_service",
            Self::WakeService(_) => "wake_service",
            Self::SleepService(_) => "sleep_service",
            Self::SleepAllServices(_) => "sleep_all_services",
            Self::ReduceAccount { .. } => "reduce_account",
            Self::OpenContentWindow { .. } => "open_content_window",
        }
    }
}

// ──────────────────────────────────────────────────────────────────────
// CommandBus — the dispatch boundary
// ──────────────────────────────────────────────────────────────────────

/// One-way command sink plus the single synchronous query the menu needs.
///
/// Implementations must no-op on commands whose ids no longer resolve;
/// callers do not re-check existence before dispatching.
pub trait CommandBus {
    /// Fire one command. At most one effect per invocation.
    fn dispatch(&self, command: Command);

    /// Live URL of a service's content view, if the host can answer.
    fn current_url(&self, service_id: &ServiceId) -> Option<String>;
}

// ──────────────────────────────────────────────────────────────────────
// RecordingBus — reference implementation / test double
// ──────────────────────────────────────────────────────────────────────

/// A [`CommandBus`] that records every dispatch, for tests and for hosts
/// that drain commands on their own schedule.
#[derive(Debug, Default)]
pub struct RecordingBus {
    dispatched: Mutex<Vec<Command>>,
    live_urls: Mutex<HashMap<ServiceId, String>>,
}

impl RecordingBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the live URL the bus reports for a service.
    pub fn set_current_url(&self, service_id: ServiceId, url: impl Into<String>) {
        let mut urls = self
            .live_urls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        urls.insert(service_id, url.into());
    }

    /// All commands dispatched so far, oldest first.
    #[must_use]
    pub fn dispatched(&self) -> Vec<Command> {
        self.dispatched
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded commands.
    pub fn take_dispatched(&self) -> Vec<Command> {
        std::mem::take(
            &mut *self
                .dispatched
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl CommandBus for RecordingBus {
    fn dispatch(&self, command: Command) {
        tracing::debug!(target: "maildock::bus", command = command.name(), "dispatch");
        self.dispatched
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(command);
    }

    fn current_url(&self, service_id: &ServiceId) -> Option<String> {
        self.live_urls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(service_id)
            .cloned()
    }
}
