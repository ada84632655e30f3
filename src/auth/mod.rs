//! Identity resolution
//!
//! Every authenticated route goes through [`IdentityResolver`]: the token's
//! `kind` claim selects the one table the subject is looked up in, and the
//! result is a [`Principal`].

pub mod extract;
pub mod tokens;

pub use extract::{CurrentPrincipal, OptionalPrincipal, RequireAdmin, RequireStaff};
pub use tokens::{Claims, IssuedToken, PrincipalKind, TokenKeys};

use redb::ReadableDatabase;
use serde::Serialize;

use crate::db::{codec, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{CustomerProfile, StaffAccount, StaffRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPrincipal {
    pub email: String,
    pub name: String,
    pub role: StaffRole,
}

impl StaffPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPrincipal {
    pub email: String,
    pub company_name: Option<String>,
}

/// An authenticated actor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    Staff(StaffPrincipal),
    Customer(CustomerPrincipal),
}

impl Principal {
    pub fn email(&self) -> &str {
        match self {
            Principal::Staff(staff) => &staff.email,
            Principal::Customer(customer) => &customer.email,
        }
    }

    /// Staff may act on any customer; customers only on themselves
    pub fn may_act_for(&self, customer_email: &str) -> bool {
        match self {
            Principal::Staff(_) => true,
            Principal::Customer(customer) => customer.email == customer_email,
        }
    }
}

/// Turns bearer tokens into principals
#[derive(Clone)]
pub struct IdentityResolver {
    db: Db,
    keys: TokenKeys,
}

impl IdentityResolver {
    pub fn new(db: Db, keys: TokenKeys) -> Self {
        Self { db, keys }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    pub async fn resolve(&self, token: &str) -> Result<Principal> {
        let claims = self.keys.verify(token)?;
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || lookup_principal(&db, &claims)).await?
    }
}

/// Load the principal named by verified claims
pub fn lookup_principal(db: &redb::Database, claims: &Claims) -> Result<Principal> {
    let read_txn = db.begin_read()?;

    match claims.kind {
        PrincipalKind::Staff => {
            let staff = read_txn.open_table(tables::STAFF)?;
            let account: StaffAccount = staff
                .get(claims.sub.as_str())?
                .map(|b| codec::decode(b.value()))
                .transpose()?
                .ok_or_else(|| {
                    tracing::warn!("Token for unknown staff account {}", claims.sub);
                    AppError::InvalidToken
                })?;

            Ok(Principal::Staff(StaffPrincipal {
                email: account.email,
                name: account.name,
                role: account.role,
            }))
        }
        PrincipalKind::Customer => {
            let profiles = read_txn.open_table(tables::PROFILES)?;
            let profile: CustomerProfile = profiles
                .get(claims.sub.as_str())?
                .map(|b| codec::decode(b.value()))
                .transpose()?
                .ok_or_else(|| {
                    tracing::warn!("Token for unknown customer {}", claims.sub);
                    AppError::InvalidToken
                })?;

            Ok(Principal::Customer(CustomerPrincipal {
                email: profile.email,
                company_name: profile.company_name,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_may_only_act_for_self() {
        let customer = Principal::Customer(CustomerPrincipal {
            email: "a@x.com".to_string(),
            company_name: None,
        });
        assert!(customer.may_act_for("a@x.com"));
        assert!(!customer.may_act_for("b@x.com"));
    }

    #[test]
    fn test_staff_may_act_for_anyone() {
        let staff = Principal::Staff(StaffPrincipal {
            email: "ops@x.com".to_string(),
            name: "Ops".to_string(),
            role: StaffRole::Staff,
        });
        assert!(staff.may_act_for("a@x.com"));
    }

    #[test]
    fn test_principal_serializes_with_kind_tag() {
        let staff = Principal::Staff(StaffPrincipal {
            email: "ops@x.com".to_string(),
            name: "Ops".to_string(),
            role: StaffRole::Admin,
        });
        let json = serde_json::to_value(&staff).unwrap();
        assert_eq!(json["kind"], "staff");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["email"], "ops@x.com");
    }
}
