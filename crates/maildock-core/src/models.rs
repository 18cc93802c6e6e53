//! Domain models for MailDock
//!
//! An account aggregates one or more provider services; each service carries
//! a shortcut pinned to one of three UI locations. These shapes are the
//! account's persisted configuration — [`crate::reducers::AccountReducer`]
//! is the only sanctioned way to rewrite location assignments.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a top-level account (mailbox).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a service nested under an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// UiLocation
// =============================================================================

/// Placement of a service shortcut in the client chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiLocation {
    Sidebar,
    ToolbarStart,
    ToolbarEnd,
}

impl UiLocation {
    /// All locations, in menu display order.
    pub const ALL: [Self; 3] = [Self::Sidebar, Self::ToolbarStart, Self::ToolbarEnd];

    /// Stable identifier used in config values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sidebar => "sidebar",
            Self::ToolbarStart => "toolbar_start",
            Self::ToolbarEnd => "toolbar_end",
        }
    }

    /// Phrase used inside menu labels ("Move service to {phrase}").
    #[must_use]
    pub const fn menu_phrase(self) -> &'static str {
        match self {
            Self::Sidebar => "the sidebar",
            Self::ToolbarStart => "the toolbar (left)",
            Self::ToolbarEnd => "the toolbar (right)",
        }
    }

    /// Parse a config value such as `"toolbar_start"`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sidebar" => Ok(Self::Sidebar),
            "toolbar_start" => Ok(Self::ToolbarStart),
            "toolbar_end" => Ok(Self::ToolbarEnd),
            other => Err(Error::InvalidUiLocation(other.to_string())),
        }
    }
}

// =============================================================================
// ServiceKind
// =============================================================================

/// Provider-specific type of a service.
///
/// The humanized labels feed the menu header (`"Inbox : (Mail)"`) and the
/// delete-service entry (`"Delete Mail Service"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Mail,
    Calendar,
    Contacts,
    Chat,
    Notes,
    WebApp,
}

impl ServiceKind {
    /// Full humanized label, e.g. `"Mail Service"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mail => "Mail Service",
            Self::Calendar => "Calendar Service",
            Self::Contacts => "Contacts Service",
            Self::Chat => "Chat Service",
            Self::Notes => "Notes Service",
            Self::WebApp => "Web App",
        }
    }

    /// Short humanized label, e.g. `"Mail"`.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Mail => "Mail",
            Self::Calendar => "Calendar",
            Self::Contacts => "Contacts",
            Self::Chat => "Chat",
            Self::Notes => "Notes",
            Self::WebApp => "Web",
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// A provider-specific unit nested under an account.
///
/// # Constraints
/// - `account_id` MUST reference the owning account.
/// - `display_name` may be empty; resolvers fall back to the kind label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub account_id: AccountId,
    pub display_name: String,
    pub kind: ServiceKind,
    /// Last known navigable URL of the service content.
    pub url: String,
    /// Whether the provider exposes a reauthentication flow.
    pub supports_reauth: bool,
}

impl Service {
    #[must_use]
    pub fn new(id: impl Into<ServiceId>, account_id: impl Into<AccountId>, kind: ServiceKind) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            display_name: String::new(),
            kind,
            url: String::new(),
            supports_reauth: false,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub const fn with_reauth(mut self, supported: bool) -> Self {
        self.supports_reauth = supported;
        self
    }
}

// =============================================================================
// Account
// =============================================================================

/// A top-level aggregated mailbox entity.
///
/// # Constraints
/// - `service_ids` is ordered; the first sidebar service is the one the
///   `collapse_first_sidebar_service` flag hides.
/// - Services absent from `ui_locations` default to the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub service_ids: Vec<ServiceId>,
    pub ui_locations: HashMap<ServiceId, UiLocation>,
    /// Hide the first sidebar service shortcut until revealed.
    pub collapse_first_sidebar_service: bool,
    /// Provider keeps cookies across restarts; enables "Clear All Cookies".
    pub persists_cookies: bool,
}

impl Account {
    #[must_use]
    pub fn new(id: impl Into<AccountId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            service_ids: Vec::new(),
            ui_locations: HashMap::new(),
            collapse_first_sidebar_service: false,
            persists_cookies: false,
        }
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.service_ids.len()
    }

    #[must_use]
    pub fn has_multiple_services(&self) -> bool {
        self.service_ids.len() > 1
    }

    /// Location of a service's shortcut; unassigned services live in the
    /// sidebar.
    #[must_use]
    pub fn ui_location_of(&self, service_id: &ServiceId) -> UiLocation {
        self.ui_locations
            .get(service_id)
            .copied()
            .unwrap_or(UiLocation::Sidebar)
    }

    /// Register a child service at the given location. Re-registering an
    /// existing id only moves it.
    pub fn push_service(&mut self, service_id: ServiceId, location: UiLocation) {
        if !self.service_ids.contains(&service_id) {
            self.service_ids.push(service_id.clone());
        }
        self.ui_locations.insert(service_id, location);
    }
}
