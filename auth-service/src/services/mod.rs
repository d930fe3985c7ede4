//! Services layer: business logic of the authentication core.

pub mod audit;
pub mod auth;
pub mod credentials;
pub mod database;
pub mod error;
pub mod jwt;
pub mod refresh;
pub mod revocation;
pub mod shipments;

pub use audit::{AuditFilter, AuditService, AuditStore, MockAuditStore, MongoAuditStore, Page};
pub use auth::AuthService;
pub use credentials::{CredentialStore, MockCredentialStore, MongoCredentialStore};
pub use database::MongoDb;
pub use error::AuthError;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, TokenResponse};
pub use refresh::{ClaimOutcome, MockRefreshTokenStore, MongoRefreshTokenStore, RefreshTokenStore};
pub use revocation::{MockRevocationStore, MongoRevocationStore, RevocationStore};
pub use shipments::{MockShipmentDirectory, MongoShipmentDirectory, ShipmentDirectory};
