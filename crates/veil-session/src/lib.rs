pub mod cookie;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Session lifetime. Tokens stay valid this long after issuance; logout
/// only clears the cookie (there is no server-side revocation list).
const SESSION_TTL_DAYS: i64 = 7;

/// JWT claims carried by the session cookie. Shared by the REST middleware
/// and the gateway handshake so both sides agree on the token format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// The identity a verified session proves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token expired")]
    Expired,
    #[error("invalid session token")]
    Invalid,
}

/// Issues and verifies signed session tokens. Stateless: verification is
/// by signature and expiry only.
#[derive(Clone)]
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Sessions {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token embedding the user's identity, expiring 7 days out.
    pub fn issue(&self, user: &SessionUser) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: (now + chrono::Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validate signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<SessionUser, SessionError> {
        let data =
            decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                    _ => SessionError::Invalid,
                }
            })?;

        Ok(SessionUser {
            id: data.claims.sub,
            name: data.claims.name,
            email: data.claims.email,
        })
    }
}
