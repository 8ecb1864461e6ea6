use crate::models::{AuthUser, Session};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token carries no email")]
    MissingEmail,

    #[error("Auth API returned error: {0}")]
    ApiError(String),
}

/// Claims carried by the backend's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Verifies access tokens locally with the backend's shared HS256 secret
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token and return the user it was issued to
    ///
    /// Tokens without an email claim are rejected.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        let email = claims
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        Ok(AuthUser { id: claims.sub, email })
    }

    /// Verify the value of an `Authorization` header
    pub fn verify_header(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.verify(token)
    }
}

/// Session endpoints of the backend (`/auth/v1`)
pub struct AuthClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AuthClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let session: Session = response.json().await?;
                tracing::info!("Signed in user {}", session.user.id);
                Ok(session)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::info!("Rejected sign-in for {}", email);
                Err(AuthError::InvalidCredentials)
            }
            status => Err(AuthError::ApiError(format!("Sign-in failed: {}", status))),
        }
    }

    /// Revoke the session belonging to `access_token`
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::ApiError(format!("Sign-out failed: {}", response.status())));
        }

        Ok(())
    }

    /// Look up the user of a live session
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::ApiError(format!("Session lookup failed: {}", status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn create_token(secret: &str, aud: &str, exp_offset: i64) -> String {
        create_token_for(secret, aud, exp_offset, Some("staff@example.com"))
    }

    fn create_token_for(secret: &str, aud: &str, exp_offset: i64, email: Option<&str>) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: email.map(str::to_string),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            aud: Some(aud.to_string()),
            role: Some("authenticated".to_string()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let token = create_token(SECRET, "authenticated", 3600);

        let user = verifier.verify(&token).unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email, "staff@example.com");
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let token = create_token("other-secret", "authenticated", 3600);

        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let token = create_token(SECRET, "authenticated", -3600);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_token_without_email() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");

        let missing = create_token_for(SECRET, "authenticated", 3600, None);
        assert!(matches!(verifier.verify(&missing), Err(AuthError::MissingEmail)));

        let blank = create_token_for(SECRET, "authenticated", 3600, Some("  "));
        assert!(matches!(verifier.verify(&blank), Err(AuthError::MissingEmail)));
    }

    #[test]
    fn test_verify_header() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let token = create_token(SECRET, "authenticated", 3600);

        assert!(verifier.verify_header(Some(&format!("Bearer {}", token))).is_ok());
        assert!(matches!(verifier.verify_header(None), Err(AuthError::MissingToken)));
        assert!(matches!(verifier.verify_header(Some("Basic abc")), Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(mockito::Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(server.url(), "anon".to_string()).unwrap();
        let result = client.sign_in("staff@example.com", "wrong").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"abc","refresh_token":"def","token_type":"bearer",
                    "expires_in":3600,"user":{"id":"user-1","email":"staff@example.com"}}"#,
            )
            .create_async()
            .await;

        let client = AuthClient::new(server.url(), "anon".to_string()).unwrap();
        let session = client.sign_in("staff@example.com", "secret").await.unwrap();

        assert_eq!(session.access_token, "abc");
        assert_eq!(session.user.email, "staff@example.com");
    }
}
