use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt work factor. Fixed at startup, never configurable per request.
const BCRYPT_COST: u32 = 12;

/// Hashes a plaintext password with a fresh salt. Two calls with the same
/// input produce different hashes.
///
/// bcrypt is CPU-heavy; handlers run this through `actix_web::web::block` so
/// it never stalls unrelated in-flight requests.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a plaintext candidate against a stored hash.
///
/// Returns false rather than erroring on a malformed stored hash, so a
/// corrupted record degrades to a failed login instead of a 500.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}
