use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{ReplaceOptions, UpdateOptions};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::models::{RevokedToken, SubjectWatermark};
use crate::services::database::MongoDb;
use crate::services::error::AuthError;

/// Revocation store: explicit per-token revocations plus per-subject
/// invalidation watermarks. The watermark check dominates the per-token
/// check during validation.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Idempotent. `expires_at` is the underlying token's own expiry so the
    /// record can be pruned once it is dead weight.
    async fn revoke_token(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Upsert the subject watermark. Later watermarks supersede earlier
    /// ones; an older concurrent write never rolls a newer watermark back.
    async fn revoke_all_for_subject(
        &self,
        subject: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    async fn is_revoked(
        &self,
        token_id: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    /// Drop explicit revocation records whose underlying token has expired.
    async fn prune_expired(&self) -> Result<u64, AuthError>;

    async fn health_check(&self) -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct MongoRevocationStore {
    db: MongoDb,
}

impl MongoRevocationStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevocationStore for MongoRevocationStore {
    async fn revoke_token(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let record = RevokedToken::new(token_id.to_string(), expires_at);
        let options = ReplaceOptions::builder().upsert(true).build();
        self.db
            .run(self.db.revoked_tokens().replace_one(
                doc! { "_id": token_id },
                &record,
                options,
            ))
            .await?;
        Ok(())
    }

    async fn revoke_all_for_subject(
        &self,
        subject: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let at_bson = mongodb::bson::to_bson(&at)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?;
        let options = UpdateOptions::builder().upsert(true).build();
        // $max keeps the latest watermark under concurrent writes; RFC 3339
        // strings compare chronologically.
        self.db
            .run(self.db.watermarks().update_one(
                doc! { "_id": subject },
                doc! { "$max": { "invalidate_before": at_bson } },
                options,
            ))
            .await?;
        Ok(())
    }

    async fn is_revoked(
        &self,
        token_id: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let watermark = self
            .db
            .run(self.db.watermarks().find_one(doc! { "_id": subject }, None))
            .await?;
        if let Some(mark) = watermark {
            if mark.covers(issued_at) {
                return Ok(true);
            }
        }

        let revoked = self
            .db
            .run(self.db.revoked_tokens().find_one(doc! { "_id": token_id }, None))
            .await?;
        Ok(revoked.is_some())
    }

    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let now = mongodb::bson::to_bson(&Utc::now())
            .map_err(|e| AuthError::Internal(anyhow::anyhow!(e)))?;
        let result = self
            .db
            .run(self.db.revoked_tokens().delete_many(
                doc! { "expires_at": { "$lt": now } },
                None,
            ))
            .await?;
        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        self.db.health_check().await
    }
}

/// In-memory revocation store for tests. `unavailable` simulates a store
/// outage to exercise the fail-closed path at the gate.
#[derive(Default)]
pub struct MockRevocationStore {
    revoked: Mutex<HashMap<String, DateTime<Utc>>>,
    watermarks: Mutex<HashMap<String, DateTime<Utc>>>,
    unavailable: AtomicBool,
}

impl MockRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::ServiceUnavailable);
        }
        Ok(())
    }

    pub fn revoked_token_ids(&self) -> HashSet<String> {
        self.revoked
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn watermark_for(&self, subject: &str) -> Option<DateTime<Utc>> {
        self.watermarks
            .lock()
            .ok()
            .and_then(|map| map.get(subject).copied())
    }
}

#[async_trait]
impl RevocationStore for MockRevocationStore {
    async fn revoke_token(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.check_available()?;
        self.revoked
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?
            .insert(token_id.to_string(), expires_at);
        Ok(())
    }

    async fn revoke_all_for_subject(
        &self,
        subject: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.check_available()?;
        let mut marks = self
            .watermarks
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        let entry = marks.entry(subject.to_string()).or_insert(at);
        if at > *entry {
            *entry = at;
        }
        Ok(())
    }

    async fn is_revoked(
        &self,
        token_id: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        self.check_available()?;
        {
            let marks = self
                .watermarks
                .lock()
                .map_err(|_| AuthError::ServiceUnavailable)?;
            if let Some(mark) = marks.get(subject) {
                if SubjectWatermark::new(subject.to_string(), *mark).covers(issued_at) {
                    return Ok(true);
                }
            }
        }
        let revoked = self
            .revoked
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        Ok(revoked.contains_key(token_id))
    }

    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut revoked = self
            .revoked
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at >= now);
        Ok((before - revoked.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
