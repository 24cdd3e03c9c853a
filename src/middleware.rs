pub mod auth;
pub mod cors;

pub use auth::{AuthError, AuthGate, TokenVerifier};
pub use cors::CorsGate;
