use std::collections::HashMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::UserRepo,
    repo_types::{User, UserPatch},
};
use crate::error::AppError;

/// Process-local user store. Uniqueness checks and writes happen under one
/// write lock, so the first of two racing writers wins.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if email_taken(&users, email, None) {
            return Err(AppError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = patch.email.as_deref() {
            if email_taken(&users, email, Some(id)) {
                return Err(AppError::Conflict);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let repo = MemoryUserRepo::new();
        let first = repo.insert("Ann", "ann@example.com", "h1").await.unwrap();
        let err = repo.insert("Other", "ann@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let stored = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ann");
        assert_eq!(stored.password_hash, "h1");
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let repo = MemoryUserRepo::new();
        let user = repo.insert("Ann", "ann@example.com", "h1").await.unwrap();
        let patch = UserPatch {
            name: Some("Annie".into()),
            ..Default::default()
        };
        let updated = repo.update(user.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.email, "ann@example.com");
        assert_eq!(updated.password_hash, "h1");
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let repo = MemoryUserRepo::new();
        let out = repo.update(Uuid::new_v4(), UserPatch::default()).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_with_taken_email_is_none() {
        let repo = MemoryUserRepo::new();
        repo.insert("Bob", "bob@example.com", "h").await.unwrap();
        let patch = UserPatch {
            email: Some("bob@example.com".into()),
            ..Default::default()
        };
        let out = repo.update(Uuid::new_v4(), patch).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts_but_own_email_is_fine() {
        let repo = MemoryUserRepo::new();
        let ann = repo.insert("Ann", "ann@example.com", "h").await.unwrap();
        repo.insert("Bob", "bob@example.com", "h").await.unwrap();

        let err = repo
            .update(
                ann.id,
                UserPatch {
                    email: Some("bob@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let same = repo
            .update(
                ann.id,
                UserPatch {
                    email: Some("ann@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn find_by_email_matches_exactly() {
        let repo = MemoryUserRepo::new();
        repo.insert("Ann", "ann@example.com", "h").await.unwrap();
        assert!(repo.find_by_email("ann@example.com").await.unwrap().is_some());
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }
}
