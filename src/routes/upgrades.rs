use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentPrincipal, OptionalPrincipal, RequireStaff};
use crate::constants::ERR_REQUIRED;
use crate::error::{AppError, Result};
use crate::models::{Decision, RequestStatus, Tier, TierChangeRequest, TierChangeRequestView};
use crate::notify::{Notification, TemplateKind};
use crate::services::lifecycle::{self, Recorded, TierChangeInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStatusResponse {
    pub customer_email: String,
    pub current_tier: Option<Tier>,
    pub current_quota: Option<String>,
    pub pending_request: Option<TierChangeRequestView>,
    pub last_request: Option<TierChangeRequestView>,
}

fn request_context(notification: Notification, request: &TierChangeRequest, name: &str) -> Notification {
    notification
        .with("name", name)
        .with("customer_email", request.customer_email.as_str())
        .with("request_id", request.id.as_str())
        .with("previous_tier", request.previous_tier.as_str())
        .with("new_tier", request.new_tier.as_str())
        .with("previous_quota", request.previous_quota.as_str())
        .with("new_quota", request.new_quota.as_str())
}

/// Customer receipt plus operations alert for a new request
fn notify_submitted(state: &AppState, recorded: &Recorded) {
    let request = &recorded.request;
    state.notifier.dispatch(request_context(
        Notification::new(request.customer_email.as_str(), TemplateKind::RequestReceived),
        request,
        &recorded.customer_name,
    ));
    state.notifier.dispatch(request_context(
        Notification::new(state.config.ops_mailbox.as_str(), TemplateKind::RequestActionRequired),
        request,
        &recorded.customer_name,
    ));
}

fn notify_decided(state: &AppState, recorded: &Recorded) {
    let request = &recorded.request;
    let kind = match request.status {
        RequestStatus::Approved => TemplateKind::UpgradeApproved,
        RequestStatus::Rejected => TemplateKind::UpgradeDenied,
        RequestStatus::Pending => return,
    };
    state.notifier.dispatch(request_context(
        Notification::new(request.customer_email.as_str(), kind),
        request,
        &recorded.customer_name,
    ));
}

/// Submit a tier-change request
///
/// Returns 201 with the new pending request, or 409 with the request that is
/// already pending for the customer. Customers authenticated with a token may
/// only submit for their own email.
pub async fn submit_upgrade_request(
    State(state): State<AppState>,
    OptionalPrincipal(principal): OptionalPrincipal,
    Json(payload): Json<TierChangeInput>,
) -> Result<(StatusCode, Json<TierChangeRequestView>)> {
    let change = payload.validate()?;

    if let Some(principal) = &principal {
        if !principal.may_act_for(&change.customer_email) {
            tracing::warn!(
                "{} attempted to submit a request for {}",
                principal.email(),
                change.customer_email
            );
            return Err(AppError::Forbidden);
        }
    }

    let db = state.db.clone();
    let recorded = tokio::task::spawn_blocking(move || {
        lifecycle::submit_request(&db, change, Utc::now().timestamp())
    })
    .await??;

    notify_submitted(&state, &recorded);

    Ok((
        StatusCode::CREATED,
        Json(TierChangeRequestView::from(&recorded.request)),
    ))
}

async fn decide(
    state: AppState,
    staff_email: String,
    request_id: String,
    decision: Decision,
) -> Result<Json<TierChangeRequestView>> {
    let db = state.db.clone();
    let recorded = tokio::task::spawn_blocking(move || {
        lifecycle::decide(
            &db,
            &request_id,
            decision,
            Some(staff_email),
            Utc::now().timestamp(),
        )
    })
    .await??;

    notify_decided(&state, &recorded);

    Ok(Json(TierChangeRequestView::from(&recorded.request)))
}

pub async fn approve_upgrade_request(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
) -> Result<Json<TierChangeRequestView>> {
    decide(state, staff.email, id, Decision::Approve).await
}

pub async fn reject_upgrade_request(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
) -> Result<Json<TierChangeRequestView>> {
    decide(state, staff.email, id, Decision::Reject).await
}

/// Current tier, outstanding request and most recent request for a customer
pub async fn upgrade_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<TierStatusResponse>> {
    let email = params
        .email
        .map(|e| crate::models::normalize_email(&e))
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::invalid_field("email", ERR_REQUIRED))?;

    let db = state.db.clone();
    let lookup = email.clone();
    let status = tokio::task::spawn_blocking(move || lifecycle::get_status(&db, &lookup)).await??;

    Ok(Json(TierStatusResponse {
        customer_email: email,
        current_tier: status.current_tier,
        current_quota: status.current_quota,
        pending_request: status.pending_request.as_ref().map(TierChangeRequestView::from),
        last_request: status.last_request.as_ref().map(TierChangeRequestView::from),
    }))
}

/// Staff view of all requests, newest first
pub async fn list_upgrade_requests(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TierChangeRequestView>>> {
    let db = state.db.clone();
    let requests =
        tokio::task::spawn_blocking(move || lifecycle::list_requests(&db, params.status)).await??;

    Ok(Json(requests.iter().map(TierChangeRequestView::from).collect()))
}

/// Request history for one customer (staff, or the customer themself)
pub async fn customer_upgrade_history(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(email): Path<String>,
) -> Result<Json<Vec<TierChangeRequestView>>> {
    let email = crate::models::normalize_email(&email);
    if !principal.may_act_for(&email) {
        return Err(AppError::Forbidden);
    }

    let db = state.db.clone();
    let requests =
        tokio::task::spawn_blocking(move || lifecycle::requests_for_customer(&db, &email)).await??;

    Ok(Json(requests.iter().map(TierChangeRequestView::from).collect()))
}
