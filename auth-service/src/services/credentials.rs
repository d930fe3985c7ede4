use async_trait::async_trait;
use mongodb::bson::doc;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::User;
use crate::services::database::MongoDb;
use crate::services::error::AuthError;

/// Credential store: user identity and password hash. Identities are never
/// physically deleted by this core.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AuthError>;
    async fn insert(&self, user: &User) -> Result<(), AuthError>;
    async fn update_password_hash(&self, user_id: &str, hash: &str) -> Result<(), AuthError>;
    async fn health_check(&self) -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct MongoCredentialStore {
    db: MongoDb,
}

impl MongoCredentialStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let normalized = email.trim().to_lowercase();
        self.db
            .run(self.db.users().find_one(doc! { "email": normalized }, None))
            .await
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AuthError> {
        self.db
            .run(self.db.users().find_one(doc! { "_id": user_id }, None))
            .await
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        self.db.run(self.db.users().insert_one(user, None)).await?;
        Ok(())
    }

    async fn update_password_hash(&self, user_id: &str, hash: &str) -> Result<(), AuthError> {
        let updated = mongodb::bson::to_bson(&chrono::Utc::now())
            .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?;
        let result = self
            .db
            .run(self.db.users().update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "password_hash": hash, "updated_at": updated } },
                None,
            ))
            .await?;
        if result.matched_count == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        self.db.health_check().await
    }
}

/// In-memory credential store for tests.
#[derive(Default)]
pub struct MockCredentialStore {
    users: Mutex<HashMap<String, User>>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let normalized = email.trim().to_lowercase();
        let users = self
            .users
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        Ok(users.values().find(|u| u.email == normalized).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AuthError> {
        let users = self
            .users
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        Ok(users.get(user_id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        self.users
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_password_hash(&self, user_id: &str, hash: &str) -> Result<(), AuthError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        match users.get_mut(user_id) {
            Some(user) => {
                user.password_hash = hash.to_string();
                user.updated_at = chrono::Utc::now();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
