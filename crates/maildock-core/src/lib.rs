//! Core types, stores, and command vocabulary for MailDock
//!
//! This crate provides:
//! - Data models (`Account`, `Service`, `UiLocation`, ...)
//! - Shared observable stores (`AccountStore`, `UserStore`)
//! - The command bus boundary (`Command`, `CommandBus`)
//! - Account configuration reducers and navigation routes
//! - Session configuration and common error types

#![forbid(unsafe_code)]

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod reducers;
pub mod routes;
pub mod store;

// Re-export key types for convenience
pub use commands::{Command, CommandBus, RecordingBus};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Account, AccountId, Service, ServiceId, ServiceKind, UiLocation};
pub use reducers::AccountReducer;
pub use routes::Route;
pub use store::{
    AccountState, AccountStore, ListenerId, Store, StoreSubscription, UserState, UserStore,
};
