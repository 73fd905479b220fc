use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// JWT payload carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Ok(Uuid::parse_str(&self.sub)?)
    }
}
