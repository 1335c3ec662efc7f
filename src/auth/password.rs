use crate::error::{AppError, AppResult};

/// Hash a plaintext password with bcrypt.
pub fn hash(plaintext: &str) -> AppResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("bcrypt hash failed: {}", e)))
}

/// Verify a plaintext password against a stored hash - constant-time via bcrypt.
/// A malformed hash verifies as false rather than erroring.
pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
