use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentPrincipal, IssuedToken, Principal, PrincipalKind, RequireAdmin};
use crate::error::{AppError, Result};
use crate::models::StaffView;
use crate::services::staff::{self, StaffInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: IssuedToken,
    pub staff: StaffView,
}

/// Staff login
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let db = state.db.clone();
    let pepper = state.config.password_pepper.clone();
    let account = tokio::task::spawn_blocking(move || {
        staff::authenticate(&db, &payload.email, &payload.password, &pepper)
    })
    .await??;

    let token = state
        .identity
        .keys()
        .issue(&account.email, PrincipalKind::Staff)?;

    tracing::info!("Staff {} logged in", account.email);

    Ok(Json(LoginResponse {
        token,
        staff: StaffView::from(&account),
    }))
}

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

/// Create a staff account (admins only)
pub async fn create_staff(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<StaffInput>,
) -> Result<(StatusCode, Json<StaffView>)> {
    let new_staff = payload.validate()?;

    let db = state.db.clone();
    let pepper = state.config.password_pepper.clone();
    let account = tokio::task::spawn_blocking(move || {
        staff::create_staff(&db, new_staff, &pepper, Utc::now().timestamp())
    })
    .await??;

    tracing::info!("{} created staff account {}", admin.email, account.email);

    Ok((StatusCode::CREATED, Json(StaffView::from(&account))))
}
