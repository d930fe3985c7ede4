pub mod audit_event;
pub mod refresh_token;
pub mod revocation;
pub mod shipment;
pub mod user;

pub use audit_event::{AuditAction, AuditEvent};
pub use refresh_token::RefreshToken;
pub use revocation::{RevokedToken, SubjectWatermark};
pub use shipment::{BankDetails, ShipmentBankRecord};
pub use user::{Role, SanitizedUser, User};
