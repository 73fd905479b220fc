use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    repo_types::User,
    services::{NewUser, ProfileChanges},
};
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login. A missing field reads as empty and fails
/// authentication like any other wrong credential.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for a profile update. Missing or empty fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() > 1 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Name is required and must be longer than 1 character".into(),
        ))
    }
}

fn check_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Your email is invalid. Please check your input and try again".into(),
        ))
    }
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Your password should have at least {} characters",
            MIN_PASSWORD_LEN
        )))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let name = self.name.trim().to_owned();
        let email = normalize_email(&self.email);
        check_name(&name)?;
        check_email(&email)?;
        check_password(&self.password)?;
        Ok(NewUser {
            name,
            email,
            password: self.password,
        })
    }
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileChanges, AppError> {
        let name = non_empty(self.name.map(|n| n.trim().to_owned()));
        let email = non_empty(self.email.map(|e| normalize_email(&e)));
        let password = non_empty(self.password);

        if let Some(name) = name.as_deref() {
            check_name(name)?;
        }
        if let Some(email) = email.as_deref() {
            check_email(email)?;
        }
        if let Some(password) = password.as_deref() {
            check_password(password)?;
        }
        Ok(ProfileChanges {
            name,
            email,
            password,
        })
    }
}
