use bcrypt::hash;
use log::error;

use crate::error::AppError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| {
        error!("password hashing failed: {}", e);
        AppError::system_exception()
    })
}

#[cfg(test)]
pub fn check_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
