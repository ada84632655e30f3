//! Storage-backed operations
//!
//! Each function runs synchronously against the database and is called from
//! route handlers through `spawn_blocking`.

pub mod issues;
pub mod lifecycle;
pub mod onboarding;
pub mod staff;
