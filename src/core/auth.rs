//! Sign up and log in against the user collection. Credentials are compared
//! as stored; this is demo data, not an identity system.

use crate::core::account::{User, UserId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("User with this email already exists.")]
    EmailTaken,

    #[error("Invalid email or password.")]
    InvalidCredentials,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: Option<String>,
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value)
}

/// Validates a signup against the existing users and builds the new record.
/// The caller appends it to the collection.
pub fn signup(users: &[User], request: &SignupRequest) -> Result<User, AuthError> {
    let full_name = require(&request.full_name, "Full name")?;
    let email = require(&request.email, "Email")?;
    if request.password.is_empty() {
        return Err(AuthError::MissingField("Password"));
    }
    if request.password != request.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
        return Err(AuthError::EmailTaken);
    }

    let next_id = users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;
    let mut user = User::new(UserId(next_id), full_name, email);
    user.password = Some(request.password.clone());
    user.phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    Ok(user)
}

pub fn login<'a>(users: &'a [User], email: &str, password: &str) -> Result<&'a User, AuthError> {
    users
        .iter()
        .find(|u| {
            u.email.eq_ignore_ascii_case(email.trim()) && u.password.as_deref() == Some(password)
        })
        .ok_or(AuthError::InvalidCredentials)
}
