use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Deserialize;

use crate::config::BootstrapAdmin;
use crate::constants::{ERR_PASSWORD_TOO_SHORT, ERR_REQUIRED, MIN_PASSWORD_LEN};
use crate::db::{codec, tables};
use crate::error::{AppError, Result};
use crate::models::{normalize_email, StaffAccount, StaffRole};
use crate::security::{hash_password, verify_password};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<StaffRole>,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: StaffRole,
}

impl StaffInput {
    pub fn validate(&self) -> Result<NewStaff> {
        let mut errors = FieldErrors::new();
        let email = errors.email("email", self.email.as_deref());
        let name = errors.required("name", self.name.as_deref());
        // Taken verbatim: login compares the exact string the client sends
        let password = match self.password.as_deref() {
            None | Some("") => {
                errors.add("password", ERR_REQUIRED);
                None
            }
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
                errors.add("password", ERR_PASSWORD_TOO_SHORT);
                None
            }
            Some(p) => Some(p.to_string()),
        };
        errors.finish()?;

        match (email, name, password) {
            (Some(email), Some(name), Some(password)) => Ok(NewStaff {
                email,
                name,
                password,
                role: self.role.unwrap_or(StaffRole::Staff),
            }),
            _ => Err(AppError::InvalidInput("Invalid staff account".to_string())),
        }
    }
}

/// Create a staff account; fails with a conflict if the email is taken
pub fn create_staff(db: &Database, staff: NewStaff, pepper: &str, now: i64) -> Result<StaffAccount> {
    let password_hash = hash_password(&staff.password, pepper)?;

    let write_txn = db.begin_write()?;
    let account = {
        let mut table = write_txn.open_table(tables::STAFF)?;
        if table.get(staff.email.as_str())?.is_some() {
            tracing::info!("Staff account {} already exists", staff.email);
            return Err(AppError::Conflict("Staff account already exists".to_string()));
        }

        let account = StaffAccount {
            password_hash,
            email: staff.email,
            name: staff.name,
            role: staff.role,
            created_at: now,
        };
        let bytes = codec::encode(&account)?;
        table.insert(account.email.as_str(), bytes.as_slice())?;
        account
    };
    write_txn.commit()?;

    tracing::info!("Staff account {} created ({:?})", account.email, account.role);
    Ok(account)
}

/// Check staff credentials. Unknown email and wrong password look the same.
pub fn authenticate(db: &Database, email: &str, password: &str, pepper: &str) -> Result<StaffAccount> {
    let email = normalize_email(email);
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::STAFF)?;

    let account: Option<StaffAccount> = table
        .get(email.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?;

    match account {
        Some(account)
            if verify_password(password, pepper, &account.password_hash) =>
        {
            Ok(account)
        }
        _ => {
            tracing::warn!("Failed login for {}", email);
            Err(AppError::Unauthorized)
        }
    }
}

/// Create the configured bootstrap admin if it doesn't exist yet.
/// Returns whether an account was created.
pub fn ensure_admin(db: &Database, admin: &BootstrapAdmin, pepper: &str, now: i64) -> Result<bool> {
    let staff = NewStaff {
        email: normalize_email(&admin.email),
        name: "Administrator".to_string(),
        password: admin.password.clone(),
        role: StaffRole::Admin,
    };

    match create_staff(db, staff, pepper, now) {
        Ok(_) => Ok(true),
        Err(AppError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_staff(email: &str) -> NewStaff {
        StaffInput {
            email: Some(email.to_string()),
            name: Some("Ops".to_string()),
            password: Some("long-enough-password".to_string()),
            role: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_create_and_authenticate() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();

        create_staff(&db, new_staff("Ops@X.com"), "pepper", 1).unwrap();
        let account = authenticate(&db, "ops@x.com", "long-enough-password", "pepper").unwrap();

        assert_eq!(account.email, "ops@x.com");
        assert_eq!(account.role, StaffRole::Staff);
        assert!(matches!(
            authenticate(&db, "ops@x.com", "wrong-password", "pepper"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&db, "nobody@x.com", "long-enough-password", "pepper"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_duplicate_staff_conflicts() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();

        create_staff(&db, new_staff("ops@x.com"), "pepper", 1).unwrap();
        assert!(matches!(
            create_staff(&db, new_staff("ops@x.com"), "pepper", 2),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();
        let admin = BootstrapAdmin {
            email: "root@x.com".to_string(),
            password: "bootstrap-password".to_string(),
        };

        assert!(ensure_admin(&db, &admin, "pepper", 1).unwrap());
        assert!(!ensure_admin(&db, &admin, "pepper", 2).unwrap());

        let account = authenticate(&db, "root@x.com", "bootstrap-password", "pepper").unwrap();
        assert_eq!(account.role, StaffRole::Admin);
    }

    #[test]
    fn test_password_kept_verbatim() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();

        let staff = StaffInput {
            email: Some("ops@x.com".to_string()),
            name: Some("Ops".to_string()),
            password: Some("  padded-password  ".to_string()),
            role: None,
        }
        .validate()
        .unwrap();
        assert_eq!(staff.password, "  padded-password  ");
        create_staff(&db, staff, "pepper", 1).unwrap();

        assert!(authenticate(&db, "ops@x.com", "  padded-password  ", "pepper").is_ok());
        assert!(matches!(
            authenticate(&db, "ops@x.com", "padded-password", "pepper"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_stored_hash_is_argon2() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();

        let account = create_staff(&db, new_staff("ops@x.com"), "pepper", 1).unwrap();
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(!account.password_hash.contains("long-enough-password"));
    }

    #[test]
    fn test_short_password_rejected() {
        let input = StaffInput {
            email: Some("ops@x.com".to_string()),
            name: Some("Ops".to_string()),
            password: Some("short".to_string()),
            role: Some(StaffRole::Admin),
        };
        match input.validate() {
            Err(AppError::Validation { fields }) => {
                assert_eq!(fields.get("password").map(String::as_str), Some(ERR_PASSWORD_TOO_SHORT));
            }
            other => panic!("expected validation error, got {:?}", other.map(|s| s.email)),
        }
    }
}
