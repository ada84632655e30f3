use axum::{extract::State, Json};
use redb::{ReadableDatabase, ReadableTableMetadata};
use serde::Serialize;
use std::fs;

use crate::{auth::RequireAdmin, db::tables, error::Result, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub request_count: u64,
    pub pending_request_count: u64,
    pub customer_count: u64,
    pub issue_count: u64,
    pub staff_count: u64,
    pub database_size_bytes: u64,
    pub database_size_human: String,
}

struct Counts {
    requests: u64,
    pending: u64,
    customers: u64,
    issues: u64,
    staff: u64,
}

/// Format bytes into human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}

/// Record counts and database size
///
/// GET /api/admin/stats
pub async fn admin_stats(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminStatsResponse>> {
    let database_size_bytes = fs::metadata(&state.config.database_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let db = state.db.clone();
    let counts = tokio::task::spawn_blocking(move || -> Result<Counts> {
        let read_txn = db.begin_read()?;
        Ok(Counts {
            requests: read_txn.open_table(tables::TIER_REQUESTS)?.len()?,
            pending: read_txn.open_table(tables::PENDING_REQUESTS)?.len()?,
            customers: read_txn.open_table(tables::PROFILES)?.len()?,
            issues: read_txn.open_table(tables::ISSUES)?.len()?,
            staff: read_txn.open_table(tables::STAFF)?.len()?,
        })
    })
    .await??;

    tracing::info!(
        "Admin stats requested by {}: {} requests ({} pending), {} database",
        admin.email,
        counts.requests,
        counts.pending,
        format_bytes(database_size_bytes)
    );

    Ok(Json(AdminStatsResponse {
        request_count: counts.requests,
        pending_request_count: counts.pending,
        customer_count: counts.customers,
        issue_count: counts.issues,
        staff_count: counts.staff,
        database_size_bytes,
        database_size_human: format_bytes(database_size_bytes),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }
}
