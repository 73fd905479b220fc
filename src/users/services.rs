use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    repo::UserRepo,
    repo_types::{User, UserPatch},
};
use crate::{
    auth::password::{hash_password_blocking, verify_password_blocking},
    error::AppError,
};

/// Validated registration input. `password` is still plaintext here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated profile changes. `password` is plaintext; `None` means unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Credential store accessor. Every write path that receives a password
/// hashes it before the record reaches the repository.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.repo.find_by_email(email).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.repo.find_by_id(id).await
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        if self.find_by_email(&new_user.email).await?.is_some() {
            warn!("email already registered");
            return Err(AppError::Conflict);
        }
        let hash = hash_password_blocking(new_user.password).await?;
        // the store's uniqueness check still decides a race between two creates
        let user = self
            .repo
            .insert(&new_user.name, &new_user.email, &hash)
            .await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: ProfileChanges) -> Result<User, AppError> {
        let password_hash = match changes.password {
            Some(plain) => Some(hash_password_blocking(plain).await?),
            None => None,
        };
        let patch = UserPatch {
            name: changes.name,
            email: changes.email,
            password_hash,
        };
        let rehashed = patch.password_hash.is_some();
        let user = self
            .repo
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        info!(user_id = %user.id, rehashed, "user updated");
        Ok(user)
    }

    /// Looks up `email` and checks `password` against the stored hash.
    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.repo.find_by_email(email).await? else {
            warn!("login unknown email");
            return Err(AppError::Unauthorized("Invalid email or password"));
        };
        let ok = verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized("Invalid email or password"));
        }
        Ok(user)
    }
}
