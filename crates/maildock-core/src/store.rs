//! Shared application stores with change broadcast.
//!
//! A [`Store`] owns one state value behind a lock and a registry of
//! listeners. Readers take clone-out snapshots; writers go through
//! [`Store::update`], which broadcasts a change marker to every
//! subscription after the mutation completes. Components drain their
//! [`StoreSubscription`] at the top of their tick, so a full re-projection
//! always observes a settled state, never a torn one.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Account, AccountId, Service, ServiceId, UiLocation};

// ──────────────────────────────────────────────────────────────────────
// Subscription plumbing
// ──────────────────────────────────────────────────────────────────────

/// Identifies one listener registration within a store.
pub type ListenerId = u64;

/// Receiving half of a store subscription.
///
/// The store sends one marker per broadcast; [`poll_changed`] drains the
/// backlog and reports whether anything arrived since the last poll.
///
/// [`poll_changed`]: StoreSubscription::poll_changed
#[derive(Debug)]
pub struct StoreSubscription {
    id: ListenerId,
    rx: Receiver<()>,
}

impl StoreSubscription {
    /// Id to pass back to [`Store::unsubscribe`].
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Drain pending change markers. Returns `true` if at least one
    /// broadcast happened since the previous poll.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: ListenerId,
    senders: Vec<(ListenerId, Sender<()>)>,
}

// ──────────────────────────────────────────────────────────────────────
// Store — locked state + broadcast
// ──────────────────────────────────────────────────────────────────────

/// A shared, observable state container.
#[derive(Debug)]
pub struct Store<S> {
    state: Mutex<S>,
    listeners: Mutex<ListenerTable>,
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            listeners: Mutex::new(ListenerTable::default()),
        }
    }

    /// Run a read closure against the current state.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&guard)
    }

    /// Mutate the state, then notify every subscription.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        {
            let mut guard = self
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&mut guard);
        }
        self.broadcast();
    }

    /// Register a listener. The caller keeps the subscription and must
    /// pass its id to [`unsubscribe`](Self::unsubscribe) on detach.
    pub fn subscribe(&self) -> StoreSubscription {
        let (tx, rx) = mpsc::channel();
        let mut table = self
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = table.next_id;
        table.next_id += 1;
        table.senders.push((id, tx));
        StoreSubscription { id, rx }
    }

    /// Remove a listener registration. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut table = self
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        table.senders.retain(|(listener_id, _)| *listener_id != id);
    }

    /// Number of live listener registrations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .senders
            .len()
    }

    fn broadcast(&self) {
        let mut table = self
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // A failed send means the receiver was dropped without
        // unsubscribing; prune it here.
        table.senders.retain(|(_, tx)| tx.send(()).is_ok());
    }
}

impl<S: Clone> Store<S> {
    /// Clone-out snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.with(Clone::clone)
    }
}

// ──────────────────────────────────────────────────────────────────────
// AccountState — accounts, services, and their runtime flags
// ──────────────────────────────────────────────────────────────────────

/// Aggregated account/service state plus the runtime flags the UI reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountState {
    accounts: HashMap<AccountId, Account>,
    services: HashMap<ServiceId, Service>,
    active_service: Option<ServiceId>,
    sleeping: HashSet<ServiceId>,
    auth_invalid: HashSet<ServiceId>,
}

impl AccountState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutation ──────────────────────────────────────────────────

    /// Insert or replace an account.
    pub fn upsert_account(&mut self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    /// Insert or replace a service and register it with its owning
    /// account at the given location. A missing owner leaves the service
    /// orphaned but resolvable, matching how deletions race in practice.
    pub fn add_service(&mut self, service: Service, location: UiLocation) {
        if let Some(account) = self.accounts.get_mut(&service.account_id) {
            account.push_service(service.id.clone(), location);
        }
        self.services.insert(service.id.clone(), service);
    }

    /// Remove a service and every runtime flag that referenced it.
    pub fn remove_service(&mut self, service_id: &ServiceId) {
        if let Some(service) = self.services.remove(service_id) {
            if let Some(account) = self.accounts.get_mut(&service.account_id) {
                account.service_ids.retain(|id| id != service_id);
                account.ui_locations.remove(service_id);
            }
        }
        self.sleeping.remove(service_id);
        self.auth_invalid.remove(service_id);
        if self.active_service.as_ref() == Some(service_id) {
            self.active_service = None;
        }
    }

    /// Remove an account together with all of its services.
    pub fn remove_account(&mut self, account_id: &AccountId) {
        if let Some(account) = self.accounts.remove(account_id) {
            for service_id in account.service_ids {
                self.services.remove(&service_id);
                self.sleeping.remove(&service_id);
                self.auth_invalid.remove(&service_id);
                if self.active_service.as_ref() == Some(&service_id) {
                    self.active_service = None;
                }
            }
        }
    }

    pub fn set_active_service(&mut self, service_id: Option<ServiceId>) {
        self.active_service = service_id;
    }

    pub fn set_service_sleeping(&mut self, service_id: ServiceId, sleeping: bool) {
        if sleeping {
            self.sleeping.insert(service_id);
        } else {
            self.sleeping.remove(&service_id);
        }
    }

    pub fn set_auth_invalid(&mut self, service_id: ServiceId, invalid: bool) {
        if invalid {
            self.auth_invalid.insert(service_id);
        } else {
            self.auth_invalid.remove(&service_id);
        }
    }

    /// Apply a reducer to an account's persisted configuration.
    pub fn reduce_account(&mut self, account_id: &AccountId, reducer: &crate::AccountReducer) {
        if let Some(account) = self.accounts.get_mut(account_id) {
            reducer.apply(account);
        }
    }

    // ── Queries ───────────────────────────────────────────────────

    #[must_use]
    pub fn account(&self, account_id: &AccountId) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    #[must_use]
    pub fn service(&self, service_id: &ServiceId) -> Option<&Service> {
        self.services.get(service_id)
    }

    /// Hard-resolving account lookup for callers that treat absence as an
    /// error (the menu itself never does).
    pub fn require_account(&self, account_id: &AccountId) -> Result<&Account> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))
    }

    /// Hard-resolving service lookup.
    pub fn require_service(&self, service_id: &ServiceId) -> Result<&Service> {
        self.services
            .get(service_id)
            .ok_or_else(|| Error::ServiceNotFound(service_id.to_string()))
    }

    /// Display name for an account: its own name, else the name of its
    /// first service, else `None`.
    #[must_use]
    pub fn resolved_account_display_name(&self, account_id: &AccountId) -> Option<String> {
        let account = self.accounts.get(account_id)?;
        if !account.display_name.is_empty() {
            return Some(account.display_name.clone());
        }
        account
            .service_ids
            .first()
            .and_then(|id| self.resolved_service_display_name(id))
    }

    /// Display name for a service: its own name, else its kind label.
    #[must_use]
    pub fn resolved_service_display_name(&self, service_id: &ServiceId) -> Option<String> {
        let service = self.services.get(service_id)?;
        if service.display_name.is_empty() {
            Some(service.kind.label().to_string())
        } else {
            Some(service.display_name.clone())
        }
    }

    #[must_use]
    pub fn is_service_sleeping(&self, service_id: &ServiceId) -> bool {
        self.sleeping.contains(service_id)
    }

    #[must_use]
    pub fn is_service_active(&self, service_id: &ServiceId) -> bool {
        self.active_service.as_ref() == Some(service_id)
    }

    #[must_use]
    pub fn is_auth_invalid(&self, service_id: &ServiceId) -> bool {
        self.auth_invalid.contains(service_id)
    }
}

/// Store of [`AccountState`].
pub type AccountStore = Store<AccountState>;

// ──────────────────────────────────────────────────────────────────────
// UserState — entitlement flags
// ──────────────────────────────────────────────────────────────────────

/// User-level entitlement flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserState {
    /// Whether the user may sleep services.
    pub has_sleep_entitlement: bool,
}

impl UserState {
    /// Seed from config until an entitlement service reports real values.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            has_sleep_entitlement: config.sleep_entitlement_default,
        }
    }
}

/// Store of [`UserState`].
pub type UserStore = Store<UserState>;
