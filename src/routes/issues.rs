use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::auth::RequireStaff;
use crate::error::{AppError, Result};
use crate::models::{IssueReport, IssueView};
use crate::notify::{Notification, TemplateKind};
use crate::services::issues::{self, IssueInput};
use crate::AppState;

fn issue_context(notification: Notification, report: &IssueReport) -> Notification {
    notification
        .with("name", report.reporter_name.clone().unwrap_or_default())
        .with("customer_email", report.reporter_email.as_str())
        .with("issue_id", report.id.as_str())
        .with("kind", report.kind.as_str())
        .with("summary", report.summary.as_str())
        .with("description", report.description.as_str())
}

/// Create the tracker issue in the background and store its key
fn mirror_issue(state: &AppState, report: IssueReport) {
    let Some(tracker) = state.tracker.clone() else {
        return;
    };
    let db = state.db.clone();

    tokio::spawn(async move {
        let key = match tracker.create_issue(&report).await {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Mirroring issue {} to Jira failed: {}", report.id, e);
                return;
            }
        };

        let issue_id = report.id.clone();
        let stored = tokio::task::spawn_blocking(move || {
            issues::attach_jira_key(&db, &issue_id, &key, Utc::now().timestamp())
        })
        .await;

        match stored {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Failed to store Jira key for {}: {}", report.id, e),
            Err(e) => tracing::error!("Jira key task for {} panicked: {}", report.id, e),
        }
    });
}

/// Report an issue or service request
///
/// The local record is committed before anything else happens; the
/// acknowledgement emails and the Jira mirror follow in the background.
pub async fn report_issue(
    State(state): State<AppState>,
    Json(payload): Json<IssueInput>,
) -> Result<(StatusCode, Json<IssueView>)> {
    let issue = payload.validate()?;

    let db = state.db.clone();
    let report =
        tokio::task::spawn_blocking(move || issues::record_issue(&db, issue, Utc::now().timestamp()))
            .await??;

    state.notifier.dispatch(issue_context(
        Notification::new(report.reporter_email.as_str(), TemplateKind::IssueReceived),
        &report,
    ));
    state.notifier.dispatch(issue_context(
        Notification::new(state.config.ops_mailbox.as_str(), TemplateKind::IssueActionRequired),
        &report,
    ));

    let view = IssueView::from(&report);
    mirror_issue(&state, report);

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_issue(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<String>,
) -> Result<Json<IssueView>> {
    let db = state.db.clone();
    let report = tokio::task::spawn_blocking(move || issues::get_issue(&db, &id))
        .await??
        .ok_or(AppError::NotFound("Issue"))?;

    Ok(Json(IssueView::from(&report)))
}
