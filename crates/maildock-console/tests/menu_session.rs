//! End-to-end session tests for the account/service context menu.
//!
//! Drives the component the way a host screen would: attach over shared
//! stores, forward key events, flip `requested_open` in response to the
//! close callback, and tick `poll` — then observe the command bus.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ftui::layout::Rect;
use ftui::{Event, Frame, GraphemePool, KeyCode, KeyEvent};

use maildock_console::{
    AccountContextMenu, CLOSE_DISPATCH_DELAY, CLOSE_LINGER, MenuAnchor, MenuReaction, MenuTarget,
};
use maildock_core::store::{AccountState, AccountStore, UserStore};
use maildock_core::{
    Account, AccountId, Command, CommandBus, RecordingBus, Service, ServiceId, ServiceKind,
    UiLocation, UserState,
};

fn seeded_stores() -> (Arc<AccountStore>, Arc<UserStore>) {
    let mut state = AccountState::new();
    state.upsert_account(Account::new("work", "Work"));
    state.add_service(
        Service::new("work-mail", "work", ServiceKind::Mail)
            .with_display_name("Inbox")
            .with_url("https://mail.example.com")
            .with_reauth(true),
        UiLocation::Sidebar,
    );
    state.add_service(
        Service::new("work-chat", "work", ServiceKind::Chat).with_display_name("Team Chat"),
        UiLocation::ToolbarStart,
    );

    let account_store = Arc::new(AccountStore::new(state));
    let user_store = Arc::new(UserStore::new(UserState {
        has_sleep_entitlement: true,
    }));
    (account_store, user_store)
}

fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn full_session_sleep_with_reopen_cancellation() {
    init_tracing();
    let t0 = Instant::now();
    let (account_store, user_store) = seeded_stores();
    let bus = Arc::new(RecordingBus::new());
    let close_requests = Rc::new(Cell::new(0_usize));
    let counter = Rc::clone(&close_requests);

    let mut menu = AccountContextMenu::new(
        MenuTarget::service("work", "work-mail"),
        Arc::clone(&account_store),
        Arc::clone(&user_store),
        Arc::clone(&bus) as Arc<dyn CommandBus>,
    )
    .with_anchor(MenuAnchor::new(20, 4))
    .on_request_close(move || counter.set(counter.get() + 1));

    menu.attach(true);
    assert!(menu.mounted());

    // The user sleeps the service: 's' jumps to the Sleep row, Enter fires.
    assert_eq!(menu.handle_event(&press(KeyCode::Char('s')), t0), MenuReaction::Consumed);
    assert_eq!(
        menu.handle_event(&press(KeyCode::Enter), t0),
        MenuReaction::CloseRequested
    );
    assert_eq!(close_requests.get(), 1);

    // The host honours the close request...
    menu.set_requested_open(false, t0);
    // ...but the user re-opens before the deferred command lands.
    menu.set_requested_open(true, t0 + Duration::from_millis(120));
    menu.poll(t0 + Duration::from_secs(2));
    assert!(bus.dispatched().is_empty(), "re-open revoked the sleep");

    // Second attempt, left alone this time.
    let t1 = t0 + Duration::from_secs(3);
    let _ = menu.handle_event(&press(KeyCode::Char('s')), t1);
    let _ = menu.handle_event(&press(KeyCode::Enter), t1);
    menu.set_requested_open(false, t1);
    menu.poll(t1 + CLOSE_DISPATCH_DELAY);
    assert_eq!(
        bus.take_dispatched(),
        vec![Command::SleepService(ServiceId::new("work-mail"))]
    );

    // The close transition finishes and the subtree unmounts.
    menu.poll(t1 + CLOSE_LINGER);
    assert!(!menu.mounted());
    assert!(menu.entries().is_empty());

    menu.detach();
    assert_eq!(account_store.listener_count(), 0);
    assert_eq!(user_store.listener_count(), 0);
}

#[test]
fn store_updates_flow_into_the_open_menu() {
    let t0 = Instant::now();
    let (account_store, user_store) = seeded_stores();
    let bus = Arc::new(RecordingBus::new());

    let mut menu = AccountContextMenu::new(
        MenuTarget::service("work", "work-mail"),
        Arc::clone(&account_store),
        Arc::clone(&user_store),
        Arc::clone(&bus) as Arc<dyn CommandBus>,
    );
    menu.attach(true);

    // Another component sleeps the service; the menu's toggle flips.
    assert!(menu.entries().iter().any(|e| e.label == "Sleep"));
    account_store.update(|state| {
        state.set_service_sleeping(ServiceId::new("work-mail"), true);
    });
    menu.poll(t0);
    assert!(menu.entries().iter().any(|e| e.label == "Awaken"));
    assert!(
        !menu.entries().iter().any(|e| e.label == "Reload"),
        "sleeping services hide the reload row"
    );

    // The entitlement is revoked mid-session; sleep rows disappear.
    user_store.update(|state| state.has_sleep_entitlement = false);
    menu.poll(t0);
    assert!(!menu.entries().iter().any(|e| e.label == "Awaken"));
    assert!(!menu.entries().iter().any(|e| e.label == "Sleep 2 Services"));
}

#[test]
fn deleting_the_account_under_the_open_menu_suppresses_rendering() {
    let t0 = Instant::now();
    let (account_store, user_store) = seeded_stores();
    let bus = Arc::new(RecordingBus::new());

    let mut menu = AccountContextMenu::new(
        MenuTarget::account("work"),
        Arc::clone(&account_store),
        Arc::clone(&user_store),
        Arc::clone(&bus) as Arc<dyn CommandBus>,
    );
    menu.attach(true);
    assert!(!menu.entries().is_empty());

    account_store.update(|state| state.remove_account(&AccountId::new("work")));
    menu.poll(t0);

    assert!(menu.mounted(), "visibility is independent of resolution");
    assert!(menu.entries().is_empty());

    // A stale gesture still degrades to an idempotent external no-op.
    menu.activate(maildock_console::MenuActionId::Resync, t0);
    assert_eq!(
        bus.dispatched(),
        vec![Command::FullSyncAccount(AccountId::new("work"))]
    );
}

#[test]
fn render_paints_only_while_mounted_and_resolved() {
    let t0 = Instant::now();
    let (account_store, user_store) = seeded_stores();
    let bus = Arc::new(RecordingBus::new());

    let mut menu = AccountContextMenu::new(
        MenuTarget::service("work", "work-chat"),
        Arc::clone(&account_store),
        Arc::clone(&user_store),
        Arc::clone(&bus) as Arc<dyn CommandBus>,
    )
    .with_anchor(MenuAnchor::new(30, 6));
    menu.attach(true);

    let area = Rect::new(0, 0, 80, 24);
    let mut pool = GraphemePool::new();
    let mut frame = Frame::new(80, 24, &mut pool);
    menu.render(area, &mut frame);

    // Close and let the linger elapse: rendering becomes a no-op.
    menu.set_requested_open(false, t0);
    menu.poll(t0 + CLOSE_LINGER);
    let mut pool = GraphemePool::new();
    let mut frame = Frame::new(80, 24, &mut pool);
    menu.render(area, &mut frame);
    assert!(menu.entries().is_empty());
}
