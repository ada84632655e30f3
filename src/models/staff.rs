use serde::{Deserialize, Serialize};

use super::timestamp_to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Staff,
}

/// Staff account stored in redb, keyed by normalized email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAccount {
    pub email: String,
    pub name: String,
    pub role: StaffRole,
    /// Argon2id PHC string, keyed with the server pepper
    pub password_hash: String,
    pub created_at: i64,
}

/// Staff account as returned by the API (no credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffView {
    pub email: String,
    pub name: String,
    pub role: StaffRole,
    pub created_at: String,
}

impl From<&StaffAccount> for StaffView {
    fn from(account: &StaffAccount) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            created_at: timestamp_to_rfc3339(account.created_at),
        }
    }
}
