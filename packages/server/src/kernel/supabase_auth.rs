//! Supabase GoTrue client (email/password auth).

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AuthIdentity, AuthProviderError, AuthSession, BaseAuthProvider, SignUpOutcome};

#[derive(Debug, Deserialize)]
struct RawUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    user: RawUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl From<RawUser> for AuthIdentity {
    fn from(user: RawUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

impl From<RawSession> for AuthSession {
    fn from(session: RawSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user: session.user.into(),
        }
    }
}

/// Interpret a sign-up body.
///
/// With auto-confirm GoTrue answers with a full session; with email
/// confirmation enabled it answers with the bare user object.
pub fn parse_sign_up(body: Value) -> Result<SignUpOutcome, AuthProviderError> {
    let parse_err = |e: serde_json::Error| {
        AuthProviderError::Unavailable(format!("unexpected sign-up response: {}", e))
    };

    if body.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value::<RawSession>(body)
            .map_err(parse_err)?
            .into();
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = body.get("user").cloned().unwrap_or(body);
    let user: RawUser = serde_json::from_value(user_value).map_err(parse_err)?;

    Ok(SignUpOutcome {
        user: user.into(),
        session: None,
    })
}

/// Pull a human message out of a GoTrue error body
pub fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("request rejected")
        .to_string()
}

pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(supabase_url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
        }
    }

    /// Status plus JSON body (`Null` when the body is empty or not JSON)
    async fn read_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }
}

#[async_trait]
impl BaseAuthProvider for SupabaseAuthClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        let response = self
            .client
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&json!({ "email": email, "password": password, "data": metadata }))
            .send()
            .await
            .map_err(|e| AuthProviderError::Unavailable(e.to_string()))?;

        let (status, body) = Self::read_json(response).await;

        if status.is_server_error() {
            warn!(status = %status, "GoTrue sign-up failed");
            return Err(AuthProviderError::Unavailable(error_message(&body)));
        }
        if !status.is_success() {
            return Err(AuthProviderError::Rejected(error_message(&body)));
        }

        debug!("GoTrue sign-up succeeded");
        parse_sign_up(body)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthProviderError::Unavailable(e.to_string()))?;

        let (status, body) = Self::read_json(response).await;

        match status {
            s if s.is_success() => serde_json::from_value::<RawSession>(body)
                .map(Into::into)
                .map_err(|e| {
                    AuthProviderError::Unavailable(format!("unexpected token response: {}", e))
                }),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                debug!(reason = %error_message(&body), "GoTrue rejected credentials");
                Err(AuthProviderError::InvalidCredentials)
            }
            s if s.is_server_error() => Err(AuthProviderError::Unavailable(error_message(&body))),
            _ => Err(AuthProviderError::Rejected(error_message(&body))),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let (_, body) = Self::read_json(response).await;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(AuthProviderError::InvalidCredentials)
        } else {
            Err(AuthProviderError::Unavailable(error_message(&body)))
        }
    }
}
