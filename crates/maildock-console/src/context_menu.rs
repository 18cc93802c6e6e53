//! The account/service context menu component.
//!
//! Owns three cooperating pieces of state:
//!
//! - the projected snapshots ([`AccountSnapshot`], [`EntitlementSnapshot`]),
//!   recomputed whole on every store broadcast and target change;
//! - the visibility lifecycle (`Closed → Open → Closing → Closed`), where
//!   unmounting lags the close request by [`CLOSE_LINGER`] so the close
//!   transition can finish visually;
//! - the pending deferred commands armed by activations under the
//!   deferred-close protocol.
//!
//! The owner drives the component: it forwards key events, flips
//! `requested_open` in response to the close callback, and calls
//! [`AccountContextMenu::poll`] from its tick. All deadlines are plain
//! data in this struct; nothing runs in the background, and `detach`
//! cancels every pending deadline unconditionally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ftui::{Event, Frame, KeyCode, KeyEventKind};
use ftui::layout::Rect;

use maildock_core::store::{AccountStore, StoreSubscription, UserStore};
use maildock_core::{AccountReducer, Command, CommandBus, Route, ServiceId};

use crate::entries::{MenuActionId, MenuEntry, compose_entries};
use crate::snapshot::{AccountSnapshot, EntitlementSnapshot, MenuTarget};
use crate::widget::{ContextMenuWidget, MenuAnchor};

/// How long an unmount lingers after the close request, covering the
/// close transition.
pub const CLOSE_LINGER: Duration = Duration::from_millis(500);

/// Delay between a close request and a deferred-close command firing.
pub const CLOSE_DISPATCH_DELAY: Duration = Duration::from_millis(300);

/// Grace between activating a service and reloading it, giving the host
/// view time to reflect the activation.
pub const RELOAD_GRACE: Duration = Duration::from_millis(100);

// ──────────────────────────────────────────────────────────────────────
// MenuPhase — the visibility lifecycle
// ──────────────────────────────────────────────────────────────────────

/// Visibility lifecycle state. `mounted` lags `requested_open` only on
/// the closing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPhase {
    /// Not requested, not mounted.
    Closed,
    /// Requested open and mounted.
    Open,
    /// Close requested; still mounted until `hide_at`.
    Closing { hide_at: Instant },
}

// ──────────────────────────────────────────────────────────────────────
// MenuReaction — result of handling one input event
// ──────────────────────────────────────────────────────────────────────

/// What the menu did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuReaction {
    /// Not handled; the menu is not accepting input.
    Ignored,
    /// Consumed; the menu stays open (focus trapping).
    Consumed,
    /// Consumed, and the close callback was invoked.
    CloseRequested,
}

#[derive(Debug)]
struct DeferredCommand {
    due: Instant,
    command: Command,
    /// Deferred-close commands die when the menu re-opens before `due`;
    /// the reload grace does not.
    cancel_on_reopen: bool,
}

// ──────────────────────────────────────────────────────────────────────
// AccountContextMenu
// ──────────────────────────────────────────────────────────────────────

/// Transient contextual action menu for an account or one of its services.
pub struct AccountContextMenu {
    target: MenuTarget,
    anchor: MenuAnchor,
    account_store: Arc<AccountStore>,
    user_store: Arc<UserStore>,
    bus: Arc<dyn CommandBus>,
    on_request_close: Box<dyn FnMut()>,
    account_sub: Option<StoreSubscription>,
    user_sub: Option<StoreSubscription>,
    snapshot: AccountSnapshot,
    entitlement: EntitlementSnapshot,
    phase: MenuPhase,
    deferred: Vec<DeferredCommand>,
    selected: usize,
    needs_redraw: bool,
}

impl AccountContextMenu {
    #[must_use]
    pub fn new(
        target: MenuTarget,
        account_store: Arc<AccountStore>,
        user_store: Arc<UserStore>,
        bus: Arc<dyn CommandBus>,
    ) -> Self {
        Self {
            target,
            anchor: MenuAnchor::default(),
            account_store,
            user_store,
            bus,
            on_request_close: Box::new(|| {}),
            account_sub: None,
            user_sub: None,
            snapshot: AccountSnapshot::default(),
            entitlement: EntitlementSnapshot::default(),
            phase: MenuPhase::Closed,
            deferred: Vec::new(),
            selected: 0,
            needs_redraw: false,
        }
    }

    /// Position the overlay relative to this anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: MenuAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Callback invoked whenever the menu wants to close, whichever
    /// protocol triggered it.
    #[must_use]
    pub fn on_request_close(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_request_close = Box::new(callback);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Subscribe to both stores, project eagerly, and seed visibility
    /// from `requested_open`.
    pub fn attach(&mut self, requested_open: bool) {
        if self.is_attached() {
            self.detach();
        }
        self.account_sub = Some(self.account_store.subscribe());
        self.user_sub = Some(self.user_store.subscribe());
        self.project_account();
        self.project_entitlement();
        self.phase = if requested_open {
            MenuPhase::Open
        } else {
            MenuPhase::Closed
        };
        self.needs_redraw = true;
        tracing::debug!(
            target: "maildock::menu",
            account = %self.target.account_id,
            requested_open,
            "attached"
        );
    }

    /// Unsubscribe from both stores and cancel every pending deadline.
    /// Nothing fires after this returns.
    pub fn detach(&mut self) {
        if let Some(sub) = self.account_sub.take() {
            self.account_store.unsubscribe(sub.id());
        }
        if let Some(sub) = self.user_sub.take() {
            self.user_store.unsubscribe(sub.id());
        }
        self.deferred.clear();
        self.phase = MenuPhase::Closed;
        tracing::debug!(target: "maildock::menu", account = %self.target.account_id, "detached");
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.account_sub.is_some()
    }

    /// Replace the target atomically and re-project.
    pub fn set_target(&mut self, target: MenuTarget) {
        if self.target != target {
            self.target = target;
            self.project_account();
        }
    }

    #[must_use]
    pub const fn target(&self) -> &MenuTarget {
        &self.target
    }

    // ── Visibility ────────────────────────────────────────────────

    /// Owner-driven open/close request.
    pub fn set_requested_open(&mut self, open: bool, now: Instant) {
        if open {
            if self.phase != MenuPhase::Open {
                // Re-opening revokes the pending unmount and any commands
                // whose only purpose was to land after the close.
                self.deferred.retain(|d| !d.cancel_on_reopen);
                self.phase = MenuPhase::Open;
                self.selected = 0;
                self.needs_redraw = true;
                tracing::debug!(target: "maildock::menu", "open");
            }
        } else if self.mounted() {
            // Every close request (re-)arms the single linger deadline.
            self.phase = MenuPhase::Closing {
                hide_at: now + CLOSE_LINGER,
            };
            tracing::debug!(target: "maildock::menu", "closing");
        }
    }

    #[must_use]
    pub const fn requested_open(&self) -> bool {
        matches!(self.phase, MenuPhase::Open)
    }

    /// Whether the menu subtree is constructed at all.
    #[must_use]
    pub const fn mounted(&self) -> bool {
        !matches!(self.phase, MenuPhase::Closed)
    }

    #[must_use]
    pub const fn phase(&self) -> MenuPhase {
        self.phase
    }

    /// Redraw flag, cleared on read.
    pub fn take_needs_redraw(&mut self) -> bool {
        let dirty = self.needs_redraw;
        self.needs_redraw = false;
        dirty
    }

    // ── Tick ──────────────────────────────────────────────────────

    /// Drain store notifications, settle the close deadline, and fire due
    /// deferred commands. Call once per host tick.
    pub fn poll(&mut self, now: Instant) {
        self.drain_store_notifications();

        if let MenuPhase::Closing { hide_at } = self.phase {
            if now >= hide_at {
                self.phase = MenuPhase::Closed;
                self.needs_redraw = true;
                tracing::debug!(target: "maildock::menu", "unmounted");
            }
        }

        let mut due = Vec::new();
        self.deferred.retain(|deferred| {
            if deferred.due <= now {
                due.push(deferred.command.clone());
                false
            } else {
                true
            }
        });
        for command in due {
            self.bus.dispatch(command);
        }
    }

    fn drain_store_notifications(&mut self) {
        if self
            .account_sub
            .as_ref()
            .is_some_and(StoreSubscription::poll_changed)
        {
            self.project_account();
        }
        if self
            .user_sub
            .as_ref()
            .is_some_and(StoreSubscription::poll_changed)
        {
            self.project_entitlement();
        }
    }

    fn project_account(&mut self) {
        let next = self
            .account_store
            .with(|state| AccountSnapshot::project(&self.target, state));
        if next != self.snapshot {
            self.snapshot = next;
            self.needs_redraw = true;
        }
    }

    fn project_entitlement(&mut self) {
        let next = self.user_store.with(EntitlementSnapshot::project);
        if next != self.entitlement {
            self.entitlement = next;
            self.needs_redraw = true;
        }
    }

    // ── Rendering ─────────────────────────────────────────────────

    /// The currently visible entries. Empty while unmounted or while the
    /// targeted account does not resolve.
    #[must_use]
    pub fn entries(&self) -> Vec<MenuEntry> {
        compose_entries(&self.snapshot, &self.entitlement, self.mounted())
    }

    /// Paint the overlay. A closed or unresolvable menu paints nothing.
    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        let selected = normalize_selection(&entries, self.selected);
        ContextMenuWidget::new(&entries, selected, self.anchor).render(area, frame);
    }

    // ── Input ─────────────────────────────────────────────────────

    /// Route one input event. While open the menu traps focus: every key
    /// is consumed even if it maps to nothing.
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> MenuReaction {
        if self.phase != MenuPhase::Open {
            return MenuReaction::Ignored;
        }
        let Event::Key(key) = event else {
            return MenuReaction::Consumed;
        };
        if key.kind != KeyEventKind::Press {
            return MenuReaction::Consumed;
        }

        let entries = self.entries();
        if entries.is_empty() {
            return MenuReaction::Ignored;
        }

        match key.code {
            KeyCode::Escape => {
                self.request_close();
                MenuReaction::CloseRequested
            }
            KeyCode::Enter => {
                let selected = normalize_selection(&entries, self.selected);
                if let Some(action) = entries.get(selected).and_then(|entry| entry.action) {
                    self.activate(action, now);
                    MenuReaction::CloseRequested
                } else {
                    MenuReaction::Consumed
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(&entries, -1);
                MenuReaction::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(&entries, 1);
                MenuReaction::Consumed
            }
            KeyCode::Char(c) if c.is_alphabetic() => {
                self.jump_to_char(&entries, c);
                MenuReaction::Consumed
            }
            _ => MenuReaction::Consumed,
        }
    }

    fn move_selection(&mut self, entries: &[MenuEntry], direction: isize) {
        let current = normalize_selection(entries, self.selected);
        let mut index = current;
        loop {
            let next = index.checked_add_signed(direction);
            match next {
                Some(next) if next < entries.len() => index = next,
                _ => break,
            }
            if entries[index].is_actionable() {
                break;
            }
        }
        if entries.get(index).is_some_and(MenuEntry::is_actionable) && index != current {
            self.selected = index;
            self.needs_redraw = true;
        }
    }

    fn jump_to_char(&mut self, entries: &[MenuEntry], c: char) {
        let lower = c.to_ascii_lowercase();
        let hit = entries.iter().position(|entry| {
            entry.is_actionable()
                && entry
                    .label
                    .chars()
                    .next()
                    .is_some_and(|first| first.to_ascii_lowercase() == lower)
        });
        if let Some(index) = hit {
            if index != self.selected {
                self.selected = index;
                self.needs_redraw = true;
            }
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────

    /// Run one menu action: request the close exactly once, then issue
    /// the action's command under its protocol.
    pub fn activate(&mut self, action: MenuActionId, now: Instant) {
        tracing::debug!(target: "maildock::menu", ?action, "activate");
        self.request_close();

        match action {
            // Immediate-close protocol.
            MenuActionId::DeleteAccount => {
                self.bus
                    .dispatch(Command::Navigate(Route::DeleteAccount(
                        self.target.account_id.clone(),
                    )));
            }
            MenuActionId::DeleteService => {
                if let Some(service_id) = self.service_target() {
                    self.bus.dispatch(Command::Navigate(Route::DeleteService(
                        self.target.account_id.clone(),
                        service_id,
                    )));
                }
            }
            MenuActionId::Resync => {
                let command = self.service_target().map_or_else(
                    || Command::FullSyncAccount(self.target.account_id.clone()),
                    Command::FullSyncService,
                );
                self.bus.dispatch(command);
            }
            MenuActionId::ClearBrowserSession => {
                self.bus
                    .dispatch(Command::ClearBrowserSession(self.target.account_id.clone()));
            }
            MenuActionId::Reauthenticate => {
                if let Some(service_id) = self.service_target() {
                    self.bus.dispatch(Command::ReauthenticateService(service_id));
                }
            }
            MenuActionId::OpenInWindow => {
                if let Some(service_id) = self.service_target() {
                    self.open_in_window(service_id);
                }
            }

            // Reload: activate now, reload after a short grace that is
            // not tied to the close transition.
            MenuActionId::ReloadService => {
                if let Some(service_id) = self.service_target() {
                    self.bus
                        .dispatch(Command::SetActiveService(service_id.clone()));
                    self.defer(Command::ReloadService(service_id), RELOAD_GRACE, false, now);
                }
            }

            // Deferred-close protocol: the command lands after the close
            // transition, and dies if the menu re-opens first.
            MenuActionId::AccountSettings => {
                self.defer_close(
                    Command::Navigate(Route::AccountSettings(self.target.account_id.clone())),
                    now,
                );
            }
            MenuActionId::AddService => {
                self.defer_close(
                    Command::Navigate(Route::AddServiceWizard(self.target.account_id.clone())),
                    now,
                );
            }
            MenuActionId::WakeService => {
                if let Some(service_id) = self.service_target() {
                    self.defer_close(Command::WakeService(service_id), now);
                }
            }
            MenuActionId::SleepService => {
                if let Some(service_id) = self.service_target() {
                    self.defer_close(Command::SleepService(service_id), now);
                }
            }
            MenuActionId::SleepAllServices => {
                self.defer_close(
                    Command::SleepAllServices(self.target.account_id.clone()),
                    now,
                );
            }
            MenuActionId::MoveAllServicesTo(location) => {
                self.defer_reduce(AccountReducer::MoveAllServicesTo { location }, now);
            }
            MenuActionId::MoveServiceTo(location) => {
                if let Some(service_id) = self.service_target() {
                    self.defer_reduce(
                        AccountReducer::MoveServiceTo {
                            service_id,
                            location,
                        },
                        now,
                    );
                }
            }
            MenuActionId::ShowFirstSidebarService => {
                self.defer_reduce(
                    AccountReducer::SetCollapseFirstSidebarService { collapsed: false },
                    now,
                );
            }
        }
    }

    fn service_target(&self) -> Option<ServiceId> {
        self.target.service_id.clone()
    }

    fn open_in_window(&self, service_id: ServiceId) {
        let live = self
            .bus
            .current_url(&service_id)
            .filter(|url| !url.is_empty());
        let url = live.or_else(|| {
            self.snapshot
                .service
                .as_ref()
                .map(|s| s.url.clone())
                .filter(|url| !url.is_empty())
        });
        match url {
            Some(url) => self
                .bus
                .dispatch(Command::OpenContentWindow { service_id, url }),
            None => {
                tracing::debug!(target: "maildock::menu", %service_id, "no url to open");
            }
        }
    }

    fn request_close(&mut self) {
        tracing::trace!(target: "maildock::menu", "close requested");
        (self.on_request_close)();
    }

    fn defer_close(&mut self, command: Command, now: Instant) {
        self.defer(command, CLOSE_DISPATCH_DELAY, true, now);
    }

    fn defer_reduce(&mut self, reducer: AccountReducer, now: Instant) {
        self.defer_close(
            Command::ReduceAccount {
                account_id: self.target.account_id.clone(),
                reducer,
            },
            now,
        );
    }

    fn defer(&mut self, command: Command, delay: Duration, cancel_on_reopen: bool, now: Instant) {
        self.deferred.push(DeferredCommand {
            due: now + delay,
            command,
            cancel_on_reopen,
        });
    }
}

/// Clamp a stored selection index onto the nearest actionable entry.
fn normalize_selection(entries: &[MenuEntry], selected: usize) -> usize {
    if entries
        .get(selected)
        .is_some_and(MenuEntry::is_actionable)
    {
        return selected;
    }
    entries
        .iter()
        .position(MenuEntry::is_actionable)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use maildock_core::store::AccountState;
    use maildock_core::{
        Account, AccountId, RecordingBus, Service, ServiceKind, UiLocation, UserState,
    };

    struct Fixture {
        account_store: Arc<AccountStore>,
        user_store: Arc<UserStore>,
        bus: Arc<RecordingBus>,
        close_count: Rc<Cell<usize>>,
        menu: AccountContextMenu,
    }

    fn seeded_account_state() -> AccountState {
        let mut state = AccountState::new();
        let mut account = Account::new("acc-1", "Work");
        account.persists_cookies = true;
        state.upsert_account(account);
        state.add_service(
            Service::new("svc-1", "acc-1", ServiceKind::Mail)
                .with_display_name("Inbox")
                .with_url("https://mail.example.com/stored")
                .with_reauth(true),
            UiLocation::Sidebar,
        );
        state.add_service(
            Service::new("svc-2", "acc-1", ServiceKind::Chat),
            UiLocation::ToolbarEnd,
        );
        state
    }

    fn fixture(target: MenuTarget) -> Fixture {
        let account_store = Arc::new(AccountStore::new(seeded_account_state()));
        let user_store = Arc::new(UserStore::new(UserState {
            has_sleep_entitlement: true,
        }));
        let bus = Arc::new(RecordingBus::new());
        let close_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&close_count);
        let menu = AccountContextMenu::new(
            target,
            Arc::clone(&account_store),
            Arc::clone(&user_store),
            Arc::clone(&bus) as Arc<dyn CommandBus>,
        )
        .on_request_close(move || counter.set(counter.get() + 1));
        Fixture {
            account_store,
            user_store,
            bus,
            close_count,
            menu,
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(ftui::KeyEvent::new(code))
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    #[test]
    fn attach_seeds_visibility_and_projects() {
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        assert!(fx.menu.mounted());
        assert!(fx.menu.requested_open());
        assert!(!fx.menu.entries().is_empty());
        assert_eq!(fx.account_store.listener_count(), 1);
        assert_eq!(fx.user_store.listener_count(), 1);
    }

    #[test]
    fn close_lingers_for_the_full_debounce() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        fx.menu.set_requested_open(false, t0);
        assert!(fx.menu.mounted());
        assert!(!fx.menu.requested_open());

        fx.menu.poll(t0 + Duration::from_millis(499));
        assert!(fx.menu.mounted(), "must stay mounted through the linger");

        fx.menu.poll(t0 + CLOSE_LINGER);
        assert!(!fx.menu.mounted());
        assert!(fx.menu.entries().is_empty());
    }

    #[test]
    fn reopen_cancels_the_pending_unmount() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        fx.menu.set_requested_open(false, t0);
        fx.menu.set_requested_open(true, t0 + Duration::from_millis(100));
        fx.menu.poll(t0 + Duration::from_millis(600));

        assert!(fx.menu.mounted());
        assert!(fx.menu.requested_open());
        assert!(!fx.menu.entries().is_empty(), "menu never flashes empty");
    }

    #[test]
    fn repeated_close_restarts_the_timer_instead_of_stacking() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        fx.menu.set_requested_open(false, t0);
        fx.menu.set_requested_open(false, t0 + Duration::from_millis(400));

        fx.menu.poll(t0 + Duration::from_millis(600));
        assert!(fx.menu.mounted(), "second close re-armed the deadline");

        fx.menu.poll(t0 + Duration::from_millis(900));
        assert!(!fx.menu.mounted());
    }

    #[test]
    fn repeated_open_is_a_noop() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        let phase = fx.menu.phase();
        fx.menu.set_requested_open(true, t0);
        assert_eq!(fx.menu.phase(), phase);
    }

    #[test]
    fn close_while_closed_stays_closed() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(false);
        fx.menu.set_requested_open(false, t0);
        assert_eq!(fx.menu.phase(), MenuPhase::Closed);
    }

    #[test]
    fn detach_unsubscribes_and_cancels_everything() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);
        fx.menu.activate(MenuActionId::SleepService, t0);
        fx.menu.set_requested_open(false, t0);

        fx.menu.detach();
        assert_eq!(fx.account_store.listener_count(), 0);
        assert_eq!(fx.user_store.listener_count(), 0);
        assert!(!fx.menu.mounted());

        fx.menu.poll(t0 + Duration::from_secs(10));
        assert!(fx.bus.dispatched().is_empty(), "nothing fires after detach");
    }

    // ── Projection ────────────────────────────────────────────────

    #[test]
    fn unresolved_account_renders_nothing_even_when_open() {
        let mut fx = fixture(MenuTarget::account("ghost"));
        fx.menu.attach(true);
        assert!(fx.menu.mounted());
        assert!(fx.menu.entries().is_empty());
    }

    #[test]
    fn store_broadcast_reprojects_on_poll() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        let _ = fx.menu.take_needs_redraw();

        fx.account_store.update(|state| {
            let mut account = Account::new("acc-1", "Renamed");
            account.persists_cookies = true;
            state.upsert_account(account);
        });
        fx.menu.poll(t0);

        assert!(fx.menu.take_needs_redraw());
        assert_eq!(fx.menu.entries()[0].label, "Renamed");
    }

    #[test]
    fn entitlement_broadcast_changes_composition() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);
        assert!(fx.menu.entries().iter().any(|e| e.label == "Sleep"));

        fx.user_store
            .update(|state| state.has_sleep_entitlement = false);
        fx.menu.poll(t0);
        assert!(!fx.menu.entries().iter().any(|e| e.label == "Sleep"));
    }

    #[test]
    fn account_deleted_mid_session_empties_the_menu() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        assert!(!fx.menu.entries().is_empty());

        fx.account_store
            .update(|state| state.remove_account(&AccountId::new("acc-1")));
        fx.menu.poll(t0);
        assert!(fx.menu.entries().is_empty());
    }

    #[test]
    fn set_target_reprojects_immediately() {
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        fx.menu.set_target(MenuTarget::service("acc-1", "svc-1"));
        assert_eq!(fx.menu.entries()[0].label, "Inbox : (Mail)");
    }

    // ── Dispatch protocols ────────────────────────────────────────

    #[test]
    fn delete_account_is_one_navigation_and_one_close() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::DeleteAccount, t0);
        fx.menu.poll(t0 + Duration::from_secs(1));

        let commands = fx.bus.dispatched();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            Command::Navigate(Route::DeleteAccount(AccountId::new("acc-1")))
        );
        assert_eq!(fx.close_count.get(), 1);
    }

    #[test]
    fn sleep_fires_only_after_the_close_dispatch_delay() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::SleepService, t0);
        assert_eq!(fx.close_count.get(), 1);
        assert!(fx.bus.dispatched().is_empty());

        fx.menu.poll(t0 + Duration::from_millis(299));
        assert!(fx.bus.dispatched().is_empty());

        fx.menu.poll(t0 + CLOSE_DISPATCH_DELAY);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::SleepService(ServiceId::new("svc-1"))]
        );
    }

    #[test]
    fn reopen_cancels_deferred_close_commands() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::SleepService, t0);
        fx.menu.set_requested_open(false, t0);
        fx.menu
            .set_requested_open(true, t0 + Duration::from_millis(100));

        fx.menu.poll(t0 + Duration::from_secs(1));
        assert!(fx.bus.dispatched().is_empty());
    }

    #[test]
    fn reload_activates_now_and_reloads_after_the_grace() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::ReloadService, t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::SetActiveService(ServiceId::new("svc-1"))]
        );

        fx.menu.poll(t0 + Duration::from_millis(99));
        assert_eq!(fx.bus.dispatched().len(), 1);

        fx.menu.poll(t0 + RELOAD_GRACE);
        assert_eq!(
            fx.bus.dispatched()[1],
            Command::ReloadService(ServiceId::new("svc-1"))
        );
    }

    #[test]
    fn reload_grace_survives_reopen() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::ReloadService, t0);
        fx.menu.set_requested_open(false, t0);
        fx.menu
            .set_requested_open(true, t0 + Duration::from_millis(50));

        fx.menu.poll(t0 + Duration::from_millis(100));
        assert_eq!(
            fx.bus.dispatched(),
            vec![
                Command::SetActiveService(ServiceId::new("svc-1")),
                Command::ReloadService(ServiceId::new("svc-1")),
            ]
        );
    }

    #[test]
    fn resync_picks_the_service_variant_when_targeted() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);
        fx.menu.activate(MenuActionId::Resync, t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::FullSyncService(ServiceId::new("svc-1"))]
        );

        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        fx.menu.activate(MenuActionId::Resync, t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::FullSyncAccount(AccountId::new("acc-1"))]
        );
    }

    #[test]
    fn open_in_window_prefers_the_live_url() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.bus
            .set_current_url(ServiceId::new("svc-1"), "https://mail.example.com/live");
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::OpenInWindow, t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::OpenContentWindow {
                service_id: ServiceId::new("svc-1"),
                url: "https://mail.example.com/live".to_string(),
            }]
        );
    }

    #[test]
    fn open_in_window_falls_back_to_the_snapshot_url() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::OpenInWindow, t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::OpenContentWindow {
                service_id: ServiceId::new("svc-1"),
                url: "https://mail.example.com/stored".to_string(),
            }]
        );
    }

    #[test]
    fn open_in_window_without_any_url_skips_the_command() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-2"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::OpenInWindow, t0);
        assert!(fx.bus.dispatched().is_empty());
        assert_eq!(fx.close_count.get(), 1);
    }

    #[test]
    fn move_service_defers_the_reducer() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        fx.menu
            .activate(MenuActionId::MoveServiceTo(UiLocation::ToolbarStart), t0);
        fx.menu.poll(t0 + CLOSE_DISPATCH_DELAY);

        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::ReduceAccount {
                account_id: AccountId::new("acc-1"),
                reducer: AccountReducer::MoveServiceTo {
                    service_id: ServiceId::new("svc-1"),
                    location: UiLocation::ToolbarStart,
                },
            }]
        );
    }

    #[test]
    fn settings_navigation_waits_for_the_close_transition() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        fx.menu.activate(MenuActionId::AccountSettings, t0);
        assert!(fx.bus.dispatched().is_empty());
        fx.menu.poll(t0 + CLOSE_DISPATCH_DELAY);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::Navigate(Route::AccountSettings(AccountId::new(
                "acc-1"
            )))]
        );
    }

    // ── Input ─────────────────────────────────────────────────────

    #[test]
    fn escape_requests_close_without_commands() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        let reaction = fx.menu.handle_event(&key(KeyCode::Escape), t0);
        assert_eq!(reaction, MenuReaction::CloseRequested);
        assert_eq!(fx.close_count.get(), 1);
        assert!(fx.bus.dispatched().is_empty());
    }

    #[test]
    fn enter_activates_the_selected_entry_exactly_once() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::service("acc-1", "svc-1"));
        fx.menu.attach(true);

        // First actionable entry is "Open in New Window".
        let reaction = fx.menu.handle_event(&key(KeyCode::Enter), t0);
        assert_eq!(reaction, MenuReaction::CloseRequested);
        assert_eq!(fx.close_count.get(), 1);
        assert_eq!(fx.bus.dispatched().len(), 1);
        assert_eq!(fx.bus.dispatched()[0].name(), "open_content_window");
    }

    #[test]
    fn selection_starts_past_the_header() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        // First actionable row is "Sleep 2 Services" (deferred-close).
        let _ = fx.menu.handle_event(&key(KeyCode::Enter), t0);
        assert!(fx.bus.dispatched().is_empty(), "sleep-all defers its command");
        fx.menu.poll(t0 + CLOSE_DISPATCH_DELAY);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::SleepAllServices(AccountId::new("acc-1"))]
        );
    }

    #[test]
    fn arrows_move_selection_over_actionable_rows() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        // Down past "Sleep 2 Services" lands on "Resync" (immediate).
        assert_eq!(fx.menu.handle_event(&key(KeyCode::Down), t0), MenuReaction::Consumed);
        let _ = fx.menu.handle_event(&key(KeyCode::Enter), t0);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::FullSyncAccount(AccountId::new("acc-1"))]
        );

        // Up from the first actionable row stays put (header is skipped).
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);
        assert_eq!(fx.menu.handle_event(&key(KeyCode::Up), t0), MenuReaction::Consumed);
        let _ = fx.menu.handle_event(&key(KeyCode::Enter), t0);
        fx.menu.poll(t0 + CLOSE_DISPATCH_DELAY);
        assert_eq!(
            fx.bus.dispatched(),
            vec![Command::SleepAllServices(AccountId::new("acc-1"))]
        );
    }

    #[test]
    fn events_are_ignored_when_not_open_and_trapped_when_open() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(false);
        assert_eq!(fx.menu.handle_event(&key(KeyCode::Enter), t0), MenuReaction::Ignored);

        fx.menu.set_requested_open(true, t0);
        assert_eq!(
            fx.menu.handle_event(&key(KeyCode::Tab), t0),
            MenuReaction::Consumed,
            "open menu traps unmapped keys"
        );

        fx.menu.set_requested_open(false, t0);
        assert_eq!(
            fx.menu.handle_event(&key(KeyCode::Enter), t0),
            MenuReaction::Ignored,
            "closing menu no longer accepts input"
        );
    }

    #[test]
    fn jump_to_char_selects_by_first_letter() {
        let t0 = Instant::now();
        let mut fx = fixture(MenuTarget::account("acc-1"));
        fx.menu.attach(true);

        let _ = fx.menu.handle_event(&key(KeyCode::Char('d')), t0);
        let _ = fx.menu.handle_event(&key(KeyCode::Enter), t0);
        assert_eq!(fx.bus.dispatched().len(), 1);
        assert_eq!(fx.bus.dispatched()[0].name(), "navigate");
    }

    // ── Lifecycle property ────────────────────────────────────────

    mod lifecycle_property {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// For any toggle script, `mounted` is false only after a full
            /// uninterrupted linger following the last close request.
            #[test]
            fn mounted_matches_the_reference_model(
                script in proptest::collection::vec((0u64..1000, any::<bool>()), 1..40)
            ) {
                let t0 = Instant::now();
                let mut fx = fixture(MenuTarget::account("acc-1"));
                fx.menu.attach(false);

                let mut now = t0;
                let mut model_mounted = false;
                let mut model_requested = false;
                let mut close_armed_at: Option<Instant> = None;

                for (delay_ms, open) in script {
                    now += Duration::from_millis(delay_ms);
                    fx.menu.poll(now);
                    if close_armed_at.is_some_and(|t| now >= t + CLOSE_LINGER) {
                        model_mounted = false;
                        close_armed_at = None;
                    }

                    fx.menu.set_requested_open(open, now);
                    if open {
                        model_mounted = true;
                        model_requested = true;
                        close_armed_at = None;
                    } else {
                        if model_mounted && model_requested {
                            close_armed_at = Some(now);
                        } else if model_mounted {
                            // Repeated close while closing: restart.
                            close_armed_at = Some(now);
                        }
                        model_requested = false;
                    }

                    prop_assert_eq!(fx.menu.mounted(), model_mounted);
                    prop_assert_eq!(fx.menu.requested_open(), model_requested);
                }
            }
        }
    }
}
