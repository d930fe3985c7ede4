pub mod audit;
pub mod auth;
pub mod pii;
pub mod user;
