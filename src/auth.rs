use thiserror::Error;
use tokio::task;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("unknown or expired session")]
    UnknownSession,

    #[error("administrator permission required")]
    AdminRequired,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    match verified {
        Ok(ok) => Ok(ok),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            Ok(false)
        }
    }
}
