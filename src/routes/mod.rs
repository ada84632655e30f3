pub mod admin;
pub mod auth;
pub mod health;
pub mod issues;
pub mod onboarding;
pub mod tiers;
pub mod upgrades;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_check;

/// All API routes, without transport layers (CORS, tracing)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tiers", get(tiers::list_tiers))
        .route("/api/onboarding", post(onboarding::onboard_customer))
        .route("/api/onboarding/:email", get(onboarding::get_customer))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/staff", post(auth::create_staff))
        .route(
            "/api/upgrade-requests",
            post(upgrades::submit_upgrade_request).get(upgrades::list_upgrade_requests),
        )
        .route("/api/upgrade-requests/status", get(upgrades::upgrade_status))
        .route(
            "/api/upgrade-requests/:id/approve",
            post(upgrades::approve_upgrade_request),
        )
        .route(
            "/api/upgrade-requests/:id/reject",
            post(upgrades::reject_upgrade_request),
        )
        .route(
            "/api/customers/:email/upgrade-requests",
            get(upgrades::customer_upgrade_history),
        )
        .route("/api/issues", post(issues::report_issue))
        .route("/api/issues/:id", get(issues::get_issue))
        .route("/api/webhooks/jira", post(webhooks::jira_webhook))
        .route("/api/admin/stats", get(admin::admin_stats))
        .with_state(state)
}
