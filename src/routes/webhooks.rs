use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::constants::WEBHOOK_SIGNATURE_HEADER;
use crate::error::{AppError, Result};
use crate::notify::{Notification, TemplateKind};
use crate::security::verify_hmac;
use crate::services::issues;
use crate::webhook::{self, EmailMatch, STRATEGIES};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub handled: bool,
    pub email: Option<String>,
    pub strategy: Option<&'static str>,
    pub reason: Option<&'static str>,
}

impl WebhookResponse {
    fn ignored(reason: &'static str) -> Self {
        Self {
            handled: false,
            email: None,
            strategy: None,
            reason: Some(reason),
        }
    }
}

fn verify_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<()> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !verify_hmac(body, signature, secret) {
        tracing::warn!("Jira webhook signature mismatch");
        return Err(AppError::InvalidSignature);
    }
    Ok(())
}

/// Jira issue-updated webhook
///
/// On a status transition the reporter is told about the new status. Events
/// without a transition, or whose reporter can't be found, are acknowledged
/// and ignored so Jira doesn't retry them.
pub async fn jira_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    if let Some(secret) = &state.config.jira_webhook_secret {
        verify_signature(&headers, &body, secret)?;
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    let Some(new_status) = webhook::status_change(&payload) else {
        return Ok(Json(WebhookResponse::ignored("no status change")));
    };
    let key = webhook::issue_key(&payload).map(str::to_string);

    let linked = match key.clone() {
        Some(key) => {
            let db = state.db.clone();
            tokio::task::spawn_blocking(move || issues::find_by_jira_key(&db, &key)).await??
        }
        None => None,
    };

    if let Some(issue) = &linked {
        let db = state.db.clone();
        let issue_id = issue.id.clone();
        let status = new_status.clone();
        tokio::task::spawn_blocking(move || {
            issues::update_status(&db, &issue_id, &status, Utc::now().timestamp())
        })
        .await??;
    }

    let found = webhook::find_reporter_email(STRATEGIES, &payload).or_else(|| {
        linked.as_ref().map(|issue| EmailMatch {
            email: issue.reporter_email.clone(),
            strategy: "linked_issue",
        })
    });

    let Some(found) = found else {
        tracing::info!("No reporter email in webhook for {:?}", key);
        return Ok(Json(WebhookResponse::ignored("no reporter email")));
    };

    let name = linked
        .as_ref()
        .and_then(|issue| issue.reporter_name.clone())
        .or_else(|| {
            payload
                .pointer("/issue/fields/reporter/displayName")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let summary = webhook::issue_summary(&payload)
        .map(str::to_string)
        .or_else(|| linked.as_ref().map(|issue| issue.summary.clone()))
        .unwrap_or_default();

    tracing::info!(
        "Jira {:?} moved to {}, notifying {} (via {})",
        key,
        new_status,
        found.email,
        found.strategy
    );

    state.notifier.dispatch(
        Notification::new(found.email.as_str(), TemplateKind::IssueUpdated)
            .with("name", name)
            .with("jira_key", key.unwrap_or_default())
            .with("summary", summary)
            .with("status", new_status),
    );

    Ok(Json(WebhookResponse {
        handled: true,
        email: Some(found.email),
        strategy: Some(found.strategy),
        reason: None,
    }))
}
