use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::auth::{CurrentPrincipal, IssuedToken, PrincipalKind};
use crate::error::{AppError, Result};
use crate::models::{normalize_email, CustomerProfileView};
use crate::notify::{Notification, TemplateKind};
use crate::services::onboarding::{self, OnboardingInput};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OnboardingResponse {
    pub profile: CustomerProfileView,
    pub token: IssuedToken,
}

/// Onboard a customer
///
/// Creates the profile (or completes one created by an earlier approval),
/// returns a customer token and sends the welcome email.
pub async fn onboard_customer(
    State(state): State<AppState>,
    Json(payload): Json<OnboardingInput>,
) -> Result<(StatusCode, Json<OnboardingResponse>)> {
    let customer = payload.validate()?;
    let default_tier = state.config.default_tier;

    let db = state.db.clone();
    let profile = tokio::task::spawn_blocking(move || {
        onboarding::onboard(&db, customer, default_tier, Utc::now().timestamp())
    })
    .await??;

    let token = state
        .identity
        .keys()
        .issue(&profile.email, PrincipalKind::Customer)?;

    state.notifier.dispatch(
        Notification::new(profile.email.as_str(), TemplateKind::Welcome)
            .with("name", profile.display_name())
            .with("company", profile.company_name.clone().unwrap_or_default())
            .with(
                "tier",
                profile.current_tier.map(|t| t.as_str()).unwrap_or("none"),
            )
            .with("quota", profile.current_quota.clone().unwrap_or_default()),
    );

    Ok((
        StatusCode::CREATED,
        Json(OnboardingResponse {
            profile: CustomerProfileView::from(&profile),
            token,
        }),
    ))
}

/// Fetch a customer profile (staff, or the customer themself)
pub async fn get_customer(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(email): Path<String>,
) -> Result<Json<CustomerProfileView>> {
    let email = normalize_email(&email);
    if !principal.may_act_for(&email) {
        return Err(AppError::Forbidden);
    }

    let db = state.db.clone();
    let profile = tokio::task::spawn_blocking(move || onboarding::get_profile(&db, &email))
        .await??
        .ok_or(AppError::NotFound("Customer"))?;

    Ok(Json(CustomerProfileView::from(&profile)))
}
