use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::FindOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::{AuditAction, AuditEvent};
use crate::services::database::MongoDb;
use crate::services::error::AuthError;

/// Filters for audit queries. All optional; combined with AND.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub actor_id: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Page {
    pub fn clamped(limit: Option<i64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(50).clamp(1, 100),
            offset: offset.unwrap_or(0),
        }
    }
}

/// Append-only audit event store.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuthError>;
    /// Newest first.
    async fn query(&self, filter: &AuditFilter, page: Page) -> Result<Vec<AuditEvent>, AuthError>;
    async fn health_check(&self) -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct MongoAuditStore {
    db: MongoDb,
}

impl MongoAuditStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditStore for MongoAuditStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuthError> {
        self.db
            .run(self.db.audit_events().insert_one(event, None))
            .await?;
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter, page: Page) -> Result<Vec<AuditEvent>, AuthError> {
        let mut query = Document::new();
        if let Some(actor_id) = &filter.actor_id {
            query.insert("actor_id", actor_id);
        }
        if let Some(action) = &filter.action {
            query.insert("action", action.as_str());
        }
        if let Some(resource_type) = &filter.resource_type {
            query.insert("resource_type", resource_type);
        }
        if let Some(resource_id) = &filter.resource_id {
            query.insert("resource_id", resource_id);
        }

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(page.offset)
            .limit(page.limit)
            .build();

        let cursor = self
            .db
            .run(self.db.audit_events().find(query, options))
            .await?;
        let events = self.db.run(cursor.try_collect()).await?;
        Ok(events)
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        self.db.health_check().await
    }
}

/// In-memory audit store for tests. `fail_writes` simulates an unavailable
/// backing store to exercise the escalation path.
#[derive(Default)]
pub struct MockAuditStore {
    events: Mutex<Vec<AuditEvent>>,
    fail_writes: AtomicBool,
}

impl MockAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditStore for MockAuditStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuthError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuthError::ServiceUnavailable);
        }
        self.events
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?
            .push(event.clone());
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter, page: Page) -> Result<Vec<AuditEvent>, AuthError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| AuthError::ServiceUnavailable)?
            .clone();
        events.retain(|e| {
            filter.actor_id.as_ref().map_or(true, |a| &e.actor_id == a)
                && filter.action.map_or(true, |a| e.action == a)
                && filter
                    .resource_type
                    .as_ref()
                    .map_or(true, |r| &e.resource_type == r)
                && filter
                    .resource_id
                    .as_ref()
                    .map_or(true, |r| &e.resource_id == r)
        });
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn health_check(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Audit trail. Writes are always awaited; the difference is what a failure
/// does to the caller.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Record an event whose loss must abort the caller's response. Used for
    /// pii_unmask: the unmasked body must never leave the process without a
    /// durably written audit entry.
    pub async fn record_required(&self, event: AuditEvent) -> Result<(), AuthError> {
        self.store.append(&event).await.map_err(|e| {
            tracing::error!(
                action = event.action.as_str(),
                actor_id = %event.actor_id,
                error = %e,
                "Required audit write failed; aborting response"
            );
            AuthError::ServiceUnavailable
        })
    }

    /// Record an event without failing the caller. The failure is still
    /// logged loudly for the security log.
    pub async fn record_best_effort(&self, event: AuditEvent) {
        if let Err(e) = self.store.append(&event).await {
            tracing::error!(
                action = event.action.as_str(),
                actor_id = %event.actor_id,
                error = %e,
                "Audit write failed"
            );
        }
    }

    pub async fn query(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<Vec<AuditEvent>, AuthError> {
        self.store.query(filter, page).await
    }

    pub async fn health_check(&self) -> Result<(), AuthError> {
        self.store.health_check().await
    }
}
