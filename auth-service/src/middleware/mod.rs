pub mod auth;
pub mod path_policy;

pub use auth::{request_gate, AuthClaims, AuthContext, AuthUser, ClientIp};
pub use path_policy::{Access, PathPolicy, PathRule};
