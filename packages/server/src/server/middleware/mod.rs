// HTTP middleware
pub mod ip_extractor;
pub mod jwt_auth;

pub use ip_extractor::*;
pub use jwt_auth::*;
