//! Menu composition — the visibility table.
//!
//! [`compose_entries`] is a pure function of the two snapshots plus the
//! mounted flag; every row's predicate lives here and nowhere else, so the
//! whole table is testable without a frame or a store.

use maildock_core::UiLocation;

use crate::snapshot::{AccountSnapshot, EntitlementSnapshot};

// ──────────────────────────────────────────────────────────────────────
// MenuActionId — what an entry does when activated
// ──────────────────────────────────────────────────────────────────────

/// Identifies the action behind a menu entry. The context menu maps each
/// id to exactly one command-bus effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuActionId {
    OpenInWindow,
    WakeService,
    SleepService,
    SleepAllServices,
    ReloadService,
    Resync,
    Reauthenticate,
    AccountSettings,
    MoveAllServicesTo(UiLocation),
    MoveServiceTo(UiLocation),
    ShowFirstSidebarService,
    ClearBrowserSession,
    AddService,
    DeleteService,
    DeleteAccount,
}

// ──────────────────────────────────────────────────────────────────────
// MenuEntry — one visible row
// ──────────────────────────────────────────────────────────────────────

/// Glyph shown in the icon column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuIcon {
    OpenInNew,
    Alarm,
    Hotel,
    SleepAll,
    Refresh,
    Sync,
    ErrorOutline,
    Lock,
    Settings,
    Sidebar,
    ToolbarStart,
    ToolbarEnd,
    Eye,
    LayersClear,
    LibraryAdd,
    Delete,
    DeleteAll,
}

impl MenuIcon {
    /// Single-cell glyph for console rendering.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::OpenInNew => '⇱',
            Self::Alarm => '⏰',
            Self::Hotel => '☾',
            Self::SleepAll => '≋',
            Self::Refresh => '↻',
            Self::Sync => '⇅',
            Self::ErrorOutline => '!',
            Self::Lock => '🔒',
            Self::Settings => '⚙',
            Self::Sidebar => '▥',
            Self::ToolbarStart => '◧',
            Self::ToolbarEnd => '◨',
            Self::Eye => '👁',
            Self::LayersClear => '⌧',
            Self::LibraryAdd => '+',
            Self::Delete => '✕',
            Self::DeleteAll => '⨂',
        }
    }
}

/// Visual weight of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Emphasis {
    #[default]
    Normal,
    /// Error styling (invalid auth, destructive surfaces).
    Danger,
}

/// One visible row of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// `None` marks the informational header, which cannot be activated.
    pub action: Option<MenuActionId>,
    pub label: String,
    pub icon: Option<MenuIcon>,
    pub emphasis: Emphasis,
}

impl MenuEntry {
    #[must_use]
    pub fn new(label: impl Into<String>, action: MenuActionId) -> Self {
        Self {
            action: Some(action),
            label: label.into(),
            icon: None,
            emphasis: Emphasis::Normal,
        }
    }

    /// The non-activatable header row.
    #[must_use]
    pub fn header(label: impl Into<String>) -> Self {
        Self {
            action: None,
            label: label.into(),
            icon: None,
            emphasis: Emphasis::Normal,
        }
    }

    #[must_use]
    pub const fn with_icon(mut self, icon: MenuIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    #[must_use]
    pub const fn danger(mut self) -> Self {
        self.emphasis = Emphasis::Danger;
        self
    }

    /// Whether the row can be selected and activated.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        self.action.is_some()
    }
}

// ──────────────────────────────────────────────────────────────────────
// compose_entries — the visibility table
// ──────────────────────────────────────────────────────────────────────

const fn location_icon(location: UiLocation) -> MenuIcon {
    match location {
        UiLocation::Sidebar => MenuIcon::Sidebar,
        UiLocation::ToolbarStart => MenuIcon::ToolbarStart,
        UiLocation::ToolbarEnd => MenuIcon::ToolbarEnd,
    }
}

/// Compose the ordered list of visible entries.
///
/// Returns an empty list while unmounted or while the targeted account no
/// longer resolves — the caller renders nothing in either case.
#[must_use]
pub fn compose_entries(
    account: &AccountSnapshot,
    entitlement: &EntitlementSnapshot,
    mounted: bool,
) -> Vec<MenuEntry> {
    if !mounted || !account.account_resolved {
        return Vec::new();
    }

    let service = account.service.as_ref();
    let mut entries = Vec::new();

    // Info & util
    entries.push(MenuEntry::header(service.map_or_else(
        || account.display_name.clone(),
        |s| format!("{} : ({})", s.display_name, s.kind.short_label()),
    )));
    if service.is_some() {
        entries.push(
            MenuEntry::new("Open in New Window", MenuActionId::OpenInWindow)
                .with_icon(MenuIcon::OpenInNew),
        );
    }

    // Sleep
    if entitlement.has_sleep_entitlement {
        if let Some(s) = service {
            entries.push(if s.sleeping {
                MenuEntry::new("Awaken", MenuActionId::WakeService).with_icon(MenuIcon::Alarm)
            } else {
                MenuEntry::new("Sleep", MenuActionId::SleepService).with_icon(MenuIcon::Hotel)
            });
        }
        if account.service_count > 1 {
            entries.push(
                MenuEntry::new(
                    format!("Sleep {} Services", account.service_count),
                    MenuActionId::SleepAllServices,
                )
                .with_icon(MenuIcon::SleepAll),
            );
        }
    }

    // Reload & sync & auth
    if service.is_some_and(|s| !s.sleeping) {
        entries.push(MenuEntry::new("Reload", MenuActionId::ReloadService).with_icon(MenuIcon::Refresh));
    }
    entries.push(MenuEntry::new("Resync", MenuActionId::Resync).with_icon(MenuIcon::Sync));
    if let Some(s) = service.filter(|s| s.supports_reauth) {
        let entry = if s.auth_invalid {
            MenuEntry::new("Reauthenticate", MenuActionId::Reauthenticate)
                .with_icon(MenuIcon::ErrorOutline)
                .danger()
        } else {
            MenuEntry::new("Reauthenticate", MenuActionId::Reauthenticate)
                .with_icon(MenuIcon::Lock)
        };
        entries.push(entry);
    }

    // Settings & placement
    entries.push(
        MenuEntry::new("Account Settings", MenuActionId::AccountSettings)
            .with_icon(MenuIcon::Settings),
    );
    if service.is_none() && account.has_multiple_services {
        for location in UiLocation::ALL {
            entries.push(
                MenuEntry::new(
                    format!("Move all services to {}", location.menu_phrase()),
                    MenuActionId::MoveAllServicesTo(location),
                )
                .with_icon(location_icon(location)),
            );
        }
    }
    if let Some(s) = service {
        if account.has_multiple_services {
            for location in UiLocation::ALL {
                if location != s.ui_location {
                    entries.push(
                        MenuEntry::new(
                            format!("Move service to {}", location.menu_phrase()),
                            MenuActionId::MoveServiceTo(location),
                        )
                        .with_icon(location_icon(location)),
                    );
                }
            }
        }
    }
    if service.is_none()
        && account.has_multiple_services
        && account.collapse_first_sidebar_service
    {
        entries.push(
            MenuEntry::new(
                "Show the first sidebar service",
                MenuActionId::ShowFirstSidebarService,
            )
            .with_icon(MenuIcon::Eye),
        );
    }

    if account.persists_cookies {
        entries.push(
            MenuEntry::new("Clear All Cookies", MenuActionId::ClearBrowserSession)
                .with_icon(MenuIcon::LayersClear),
        );
    }

    // Add
    entries.push(
        MenuEntry::new("Add another service", MenuActionId::AddService)
            .with_icon(MenuIcon::LibraryAdd),
    );

    // Delete
    if let Some(s) = service {
        if account.has_multiple_services {
            entries.push(
                MenuEntry::new(format!("Delete {}", s.kind.label()), MenuActionId::DeleteService)
                    .with_icon(MenuIcon::Delete),
            );
        }
    }
    entries.push(if account.has_multiple_services {
        MenuEntry::new(
            format!("Delete Account ({} services)", account.service_count),
            MenuActionId::DeleteAccount,
        )
        .with_icon(MenuIcon::DeleteAll)
    } else {
        MenuEntry::new("Delete Account", MenuActionId::DeleteAccount).with_icon(MenuIcon::Delete)
    });

    entries
}
