use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Password Hashing
// =============================================================================

/// Argon2id keyed with the server pepper. The pepper lives in the
/// environment, never in the database.
fn argon2(pepper: &str) -> Result<Argon2<'_>> {
    Argon2::new_with_secret(
        pepper.as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Hash a staff password into a PHC string (algorithm, params and salt included)
pub fn hash_password(password: &str, pepper: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2(pepper)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash. A malformed hash never matches.
pub fn verify_password(password: &str, pepper: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };
    match argon2(pepper) {
        Ok(hasher) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

// =============================================================================
// Webhook Signatures
// =============================================================================

/// Verify HMAC-SHA256 signature
///
/// Accepts a bare hex signature or the `sha256=<hex>` form sent in
/// `X-Hub-Signature` headers.
pub fn verify_hmac(data: &[u8], signature: &str, secret: &str) -> bool {
    // Create HMAC instance with secret key
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data);

    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

    // Decode hex signature
    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Verify signature
    mac.verify_slice(&sig_bytes).is_ok()
}
