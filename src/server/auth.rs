//! Bearer-token identity for API requests.
//!
//! Tokens are `<user_id>.<hex hmac-sha256(user_id)>`, signed with the
//! configured session secret.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::handlers::{ApiError, AppState};
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct SessionKeys {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, user_id: &str) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("hmac key length is unrestricted"));
        mac.update(user_id.as_bytes());
        mac
    }

    /// Mint a token for `user_id`
    pub fn issue(&self, user_id: &str) -> String {
        let signature = self.mac(user_id).finalize().into_bytes();
        format!("{}.{}", user_id, hex::encode(signature))
    }

    /// Return the user id a token was issued for
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let (user_id, signature) = token.rsplit_once('.').ok_or(AuthError::Malformed)?;
        if user_id.is_empty() {
            return Err(AuthError::Malformed);
        }
        let signature = hex::decode(signature).map_err(|_| AuthError::Malformed)?;
        self.mac(user_id)
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;
        Ok(user_id.to_string())
    }
}

/// The verified caller of a request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Malformed)?
            .trim();
        let user_id = state.sessions.verify(token)?;
        Ok(AuthUser(user_id))
    }
}

/// A verified caller listed as a league admin
#[derive(Debug, Clone, PartialEq)]
pub struct AdminUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        if !state.admins.contains(&user_id) {
            return Err(AuthError::Forbidden.into());
        }
        Ok(AdminUser(user_id))
    }
}
