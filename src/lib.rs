//! Supportdesk Server Library
//!
//! Customer onboarding, tier-change requests and support issue intake.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod security;
pub mod services;
pub mod tracker;
pub mod validation;
pub mod webhook;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use std::sync::Arc;

use auth::{IdentityResolver, TokenKeys};
use notify::Dispatcher;
use tracker::IssueTracker;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub notifier: Dispatcher,
    /// Issue mirroring is skipped when no tracker is configured
    pub tracker: Option<Arc<dyn IssueTracker>>,
    pub identity: IdentityResolver,
}

impl AppState {
    pub fn new(
        db: Db,
        config: Config,
        notifier: Dispatcher,
        tracker: Option<Arc<dyn IssueTracker>>,
    ) -> Self {
        let keys = TokenKeys::new(&config.jwt_secret, config.token_ttl_hours);
        let identity = IdentityResolver::new(db.clone(), keys);
        Self {
            db,
            config,
            notifier,
            tracker,
            identity,
        }
    }
}
