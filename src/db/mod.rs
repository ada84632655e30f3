pub mod codec;
pub mod tables;

use redb::{Database, Error as RedbError};
use std::path::Path;
use std::sync::Arc;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create every table so read transactions never hit a missing table
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::TIER_REQUESTS)?;
        let _ = write_txn.open_table(tables::CUSTOMER_REQUESTS)?;
        let _ = write_txn.open_table(tables::PENDING_REQUESTS)?;
        let _ = write_txn.open_table(tables::PROFILES)?;
        let _ = write_txn.open_table(tables::STAFF)?;
        let _ = write_txn.open_table(tables::ISSUES)?;
        let _ = write_txn.open_table(tables::JIRA_ISSUES)?;
    }
    write_txn.commit()?;
    Ok(())
}
