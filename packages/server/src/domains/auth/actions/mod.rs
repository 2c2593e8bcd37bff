//! Sign-up, login and logout against the auth provider.
//!
//! Profiles are kept in step with auth users: sign-up creates the row and
//! login refreshes it, so users created from the provider's dashboard get a
//! profile on first login.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::{ApiError, ApiResult};
use crate::domains::profiles::Profile;
use crate::kernel::{AuthIdentity, AuthProviderError, AuthSession, ServerDeps};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub user: AuthIdentity,
    /// `null` until the email address is confirmed
    pub session: Option<AuthSession>,
}

/// `local@domain.tld` shape check; the provider does the real validation
pub fn validate_email(email: &str) -> ApiResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain
                    .find('.')
                    .is_some_and(|dot| dot > 0 && dot < domain.len() - 1)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request("a valid email address is required"))
    }
}

pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl From<AuthProviderError> for ApiError {
    fn from(e: AuthProviderError) -> Self {
        match e {
            AuthProviderError::InvalidCredentials => ApiError::Unauthorized,
            AuthProviderError::Rejected(message) => ApiError::BadRequest(message),
            AuthProviderError::Unavailable(message) => ApiError::Upstream(message),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn sign_up(request: SignUpRequest, deps: &ServerDeps) -> ApiResult<SignUpResponse> {
    let email = request.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_password(&request.password)?;

    let full_name = non_blank(request.full_name.as_deref());
    let phone = non_blank(request.phone.as_deref());

    let outcome = deps
        .auth_provider
        .sign_up(
            &email,
            &request.password,
            json!({ "full_name": full_name, "phone": phone }),
        )
        .await?;

    let profile_email = outcome.user.email.clone().unwrap_or_else(|| email.clone());
    match Profile::find_by_email(&profile_email, &deps.db_pool).await? {
        // With email confirmation on, the provider answers a repeated sign-up
        // with a fresh unconfirmed identity instead of an error.
        Some(existing) if existing.id != outcome.user.id => {
            if outcome.session.is_some() {
                return Err(ApiError::Conflict("email already registered".to_string()));
            }
            debug!(
                user_id = %outcome.user.id,
                "Sign-up for an already registered email, profile left as is"
            );
        }
        _ => {
            Profile::upsert(outcome.user.id, &profile_email, full_name, phone, &deps.db_pool)
                .await?;
        }
    }

    info!(
        user_id = %outcome.user.id,
        confirmed = outcome.session.is_some(),
        "User signed up"
    );

    Ok(SignUpResponse {
        user: outcome.user,
        session: outcome.session,
    })
}

pub async fn log_in(request: LoginRequest, deps: &ServerDeps) -> ApiResult<AuthSession> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let session = deps
        .auth_provider
        .sign_in_with_password(&email, &request.password)
        .await?;

    let profile_email = session.user.email.clone().unwrap_or(email);
    if let Err(e) =
        Profile::upsert(session.user.id, &profile_email, None, None, &deps.db_pool).await
    {
        warn!(error = %e, user_id = %session.user.id, "Failed to refresh profile on login");
    }

    info!(user_id = %session.user.id, "User logged in");
    Ok(session)
}

pub async fn log_out(user_id: Uuid, access_token: &str, deps: &ServerDeps) -> ApiResult<()> {
    deps.auth_provider.sign_out(access_token).await?;
    info!(user_id = %user_id, "User logged out");
    Ok(())
}

pub async fn current_profile(user_id: Uuid, deps: &ServerDeps) -> ApiResult<Profile> {
    Profile::find_by_id(user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile".to_string()))
}
