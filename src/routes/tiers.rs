use axum::Json;
use serde::Serialize;

use crate::models::Tier;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInfo {
    pub tier: Tier,
    /// None for custom, whose quota is negotiated per customer
    pub default_quota: Option<&'static str>,
}

pub async fn list_tiers() -> Json<Vec<TierInfo>> {
    Json(
        Tier::ALL
            .iter()
            .map(|tier| TierInfo {
                tier: *tier,
                default_quota: tier.default_quota(),
            })
            .collect(),
    )
}
