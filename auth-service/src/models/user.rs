use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User role. Authorization decisions match exhaustively over this closed
/// set; no string comparison anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// User identity stored in MongoDB. Never physically deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique, stored lower-cased.
    pub email: String,

    pub password_hash: String,

    pub name: Option<String>,

    /// Tenant/company this user belongs to, if any.
    pub company_id: Option<String>,

    pub role: Role,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        name: Option<String>,
        company_id: Option<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            name,
            company_id,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User representation safe to return to clients (no password hash).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanitizedUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub company_id: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for SanitizedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            company_id: user.company_id,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
