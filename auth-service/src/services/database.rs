//! MongoDB wrapper owning the collections of this core.

use mongodb::options::IndexOptions;
use mongodb::{bson::doc, Client, Collection, Database, IndexModel};
use std::time::Duration;

use crate::models::{AuditEvent, RefreshToken, RevokedToken, ShipmentBankRecord, SubjectWatermark, User};
use crate::services::error::AuthError;

/// MongoDB wrapper. Cheap to clone; all store operations run under the
/// configured bounded timeout.
#[derive(Clone)]
pub struct MongoDb {
    database: Database,
    op_timeout: Duration,
}

impl MongoDb {
    pub async fn connect(
        uri: &str,
        database: &str,
        op_timeout_ms: u64,
    ) -> Result<Self, AuthError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("MongoDB connect failed: {}", e)))?;

        Ok(Self {
            database: client.database(database),
            op_timeout: Duration::from_millis(op_timeout_ms),
        })
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub fn refresh_tokens(&self) -> Collection<RefreshToken> {
        self.database.collection("refresh_tokens")
    }

    pub fn revoked_tokens(&self) -> Collection<RevokedToken> {
        self.database.collection("revoked_tokens")
    }

    pub fn watermarks(&self) -> Collection<SubjectWatermark> {
        self.database.collection("revocation_watermarks")
    }

    pub fn audit_events(&self) -> Collection<AuditEvent> {
        self.database.collection("audit_events")
    }

    pub fn shipments(&self) -> Collection<ShipmentBankRecord> {
        self.database.collection("shipments")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AuthError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.run(self.users().create_index(unique_email, None))
            .await?;

        let refresh_by_user = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .build();
        self.run(self.refresh_tokens().create_index(refresh_by_user, None))
            .await?;

        let audit_order = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .build();
        self.run(self.audit_events().create_index(audit_order, None))
            .await?;

        let audit_by_actor = IndexModel::builder()
            .keys(doc! { "actor_id": 1, "created_at": -1 })
            .build();
        self.run(self.audit_events().create_index(audit_by_actor, None))
            .await?;

        tracing::info!("MongoDB indexes initialized");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AuthError> {
        self.run(self.database.run_command(doc! { "ping": 1 }, None))
            .await?;
        Ok(())
    }

    /// Run a store operation under the bounded timeout. A timeout or driver
    /// error both surface as `ServiceUnavailable`: the gate must fail closed,
    /// never pass through silently.
    pub async fn run<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, mongodb::error::Error>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "MongoDB operation failed");
                Err(AuthError::ServiceUnavailable)
            }
            Err(_) => {
                tracing::error!(timeout_ms = %self.op_timeout.as_millis(), "MongoDB operation timed out");
                Err(AuthError::ServiceUnavailable)
            }
        }
    }
}
