use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Explicit revocation of a single token id (logout of one session).
/// Prunable once the underlying token's own expiry has passed; the Mongo
/// store puts a TTL index on `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokedToken {
    /// The revoked token's jti
    #[serde(rename = "_id")]
    pub id: String,

    /// Expiry of the underlying token; after this instant the record is dead
    /// weight and may be pruned
    pub expires_at: DateTime<Utc>,

    pub revoked_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn new(token_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: token_id,
            expires_at,
            revoked_at: Utc::now(),
        }
    }
}

/// Per-subject invalidation watermark: every token issued strictly before
/// `invalidate_before` is dead, regardless of its own expiry. Only the
/// latest watermark per subject matters; writes upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectWatermark {
    /// The subject (user id)
    #[serde(rename = "_id")]
    pub id: String,

    pub invalidate_before: DateTime<Utc>,
}

impl SubjectWatermark {
    pub fn new(subject: String, invalidate_before: DateTime<Utc>) -> Self {
        Self {
            id: subject,
            invalidate_before,
        }
    }

    /// Whether a token issued at `issued_at` is covered by this watermark.
    /// Tokens issued at or after the watermark instant stay valid.
    pub fn covers(&self, issued_at: DateTime<Utc>) -> bool {
        issued_at < self.invalidate_before
    }
}
