use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::RefreshToken;
use crate::services::database::MongoDb;
use crate::services::error::AuthError;

/// Result of trying to consume a refresh token. Claiming is the single
/// atomic step of rotation: of two racing rotations, at most one claims.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// This caller flipped `used` from false to true.
    Claimed(RefreshToken),
    /// The token exists but was consumed earlier (or by the racing winner).
    AlreadyUsed(RefreshToken),
    NotFound,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> Result<(), AuthError>;
    async fn find(&self, token_id: &str) -> Result<Option<RefreshToken>, AuthError>;
    /// Atomically mark the token used. Exactly one concurrent caller can
    /// observe `Claimed` for a given token.
    async fn claim(&self, token_id: &str) -> Result<ClaimOutcome, AuthError>;
    async fn health_check(&self) -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct MongoRefreshTokenStore {
    db: MongoDb,
}

impl MongoRefreshTokenStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStore for MongoRefreshTokenStore {
    async fn insert(&self, token: &RefreshToken) -> Result<(), AuthError> {
        self.db
            .run(self.db.refresh_tokens().insert_one(token, None))
            .await?;
        Ok(())
    }

    async fn find(&self, token_id: &str) -> Result<Option<RefreshToken>, AuthError> {
        self.db
            .run(self.db.refresh_tokens().find_one(doc! { "_id": token_id }, None))
            .await
    }

    async fn claim(&self, token_id: &str) -> Result<ClaimOutcome, AuthError> {
        let used_at = mongodb::bson::to_bson(&chrono::Utc::now())
            .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        // The filter on `used: false` makes this a compare-and-swap; the
        // database serializes racing claims.
        let claimed = self
            .db
            .run(self.db.refresh_tokens().find_one_and_update(
                doc! { "_id": token_id, "used": false },
                doc! { "$set": { "used": true, "used_at": used_at } },
                options,
            ))
            .await?;

        if let Some(token) = claimed {
            return Ok(ClaimOutcome::Claimed(token));
        }

        match self.find(token_id).await? {
            Some(token) => Ok(ClaimOutcome::AlreadyUsed(token)),
            None => Ok(ClaimOutcome::NotFound),
        }
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        self.db.health_check().await
    }
}

/// In-memory refresh token store for tests. The claim path holds one mutex,
/// giving the same at-most-one-winner guarantee the Mongo filter does.
#[derive(Default)]
pub struct MockRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshToken>>,
}

impl MockRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MockRefreshTokenStore {
    async fn insert(&self, token: &RefreshToken) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?
            .insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token_id: &str) -> Result<Option<RefreshToken>, AuthError> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        Ok(tokens.get(token_id).cloned())
    }

    async fn claim(&self, token_id: &str) -> Result<ClaimOutcome, AuthError> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        match tokens.get_mut(token_id) {
            Some(token) if !token.used => {
                token.used = true;
                token.used_at = Some(chrono::Utc::now());
                Ok(ClaimOutcome::Claimed(token.clone()))
            }
            Some(token) => Ok(ClaimOutcome::AlreadyUsed(token.clone())),
            None => Ok(ClaimOutcome::NotFound),
        }
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
