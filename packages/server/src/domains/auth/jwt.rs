use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience Supabase stamps on access tokens for signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Provider-managed metadata (users cannot edit this)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims carried by a Supabase access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,                 // auth.users.id
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,              // Postgres role ("authenticated")
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.app_metadata.role.as_deref() == Some("admin")
    }
}

/// Verifies Supabase access tokens (HS256, project JWT secret)
#[derive(Clone)]
pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token shaped like Supabase's. Used by tests and local tooling;
    /// production tokens come from GoTrue.
    ///
    /// Token expires after 1 hour
    pub fn create_token(&self, user_id: Uuid, email: &str, is_admin: bool) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(1);

        let claims = Claims {
            sub: user_id,
            email: Some(email.to_string()),
            role: "authenticated".to_string(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            app_metadata: AppMetadata {
                role: is_admin.then(|| "admin".to_string()),
            },
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode an access token
    ///
    /// Returns claims if the signature, audience and expiry check out
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}
