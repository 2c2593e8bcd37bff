use crate::common::ApiError;
use crate::domains::auth::JwtVerifier;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Authenticated user information from the Supabase access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
    /// Raw bearer token, forwarded on logout
    pub access_token: String,
}

/// JWT authentication middleware
///
/// Extracts the access token from the Authorization header, verifies it, and adds AuthUser to request extensions.
/// If no token or invalid token, request continues without AuthUser (public access).
pub async fn jwt_auth_middleware(
    jwt: Arc<JwtVerifier>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt);

    if let Some(user) = auth_user {
        debug!(
            "Authenticated user: {} (admin: {})",
            user.user_id, user.is_admin
        );
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify the access token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt: &JwtVerifier,
) -> Option<AuthUser> {
    // Get Authorization header
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();

    // Verify token
    let claims = jwt.verify_token(token).ok()?;

    Some(AuthUser {
        user_id: claims.sub,
        is_admin: claims.is_admin(),
        email: claims.email,
        access_token: token.to_string(),
    })
}

/// Handlers that take `AuthUser` require a signed-in caller (401 otherwise);
/// `Option<AuthUser>` accepts anonymous callers too.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
