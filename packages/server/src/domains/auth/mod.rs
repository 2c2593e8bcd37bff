//! Auth domain - Supabase email/password auth and access-token verification
//!
//! Responsibilities:
//! - Sign-up / login / logout pass-through to GoTrue
//! - Keeping `profiles` in step with auth users
//! - Verifying access tokens locally with the project JWT secret

pub mod actions;
pub mod jwt;

pub use jwt::{AppMetadata, Claims, JwtVerifier};
