use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Role, User},
    password::CredentialHasher,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the standard payload structure embedded inside a signed bearer token.
/// These claims are signed with the process-wide secret and validated on every
/// authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user. This is the primary key used to re-fetch
    /// the user's current role from the users table on each request.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the token was issued.
    pub iat: usize,
}

/// TokenError
///
/// Verification failure taxonomy. Every variant is an unconditional reject; callers
/// only ever see a generic 401, the variant exists for logging and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The value does not decode as a JWT at all.
    #[error("token is not a well-formed JWT")]
    Malformed,
    /// The signature does not verify under the configured secret.
    #[error("token signature does not match the signing secret")]
    BadSignature,
    /// Signature verified but the expiry timestamp is in the past.
    #[error("token has expired")]
    Expired,
}

/// TokenService
///
/// Issues and verifies signed, time-bounded identity tokens (HS256). The signing
/// secret and TTL are injected at construction and immutable for the process
/// lifetime; the service holds no other state, so a single instance is shared
/// across all concurrent requests without locking.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// issue
    ///
    /// Builds claims `{sub, iat=now, exp=now+ttl}` and returns the compact encoded
    /// token string.
    pub fn issue(&self, subject: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        let claims = Claims {
            sub: subject,
            exp: now + self.ttl.as_secs() as usize,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// verify
    ///
    /// Decodes the token, checking signature integrity before any claim is
    /// interpreted, then the expiry. Returns the subject id on success. There is no
    /// partial trust: every failure is a hard reject.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // A token is valid strictly before its expiry; no grace window.
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }),
        }
    }
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("time")
        .as_secs() as usize
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: the durable user id plus the
/// role as read from the user store *for this request*. Handlers use this struct to
/// attribute writes and the role gate uses it for authorization.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to users.id.
    pub id: Uuid,
    /// The user's current role. Re-fetched per request, never taken from the token.
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler and as the first stage of the gate
/// middleware. The per-request pipeline:
/// 1. Reuse: a decision already attached by the gate middleware is returned as-is,
///    so handlers behind the gate never re-verify the credential.
/// 2. Credential Extraction: standard `Authorization: Bearer <token>` handling.
///    A missing header, a non-Bearer scheme and an empty value are all rejected
///    identically.
/// 3. Token Verification: signature and expiry via the injected TokenService.
/// 4. Identity Resolution: the user row is loaded by id to obtain the current role.
///    This rejects tokens whose subject was deleted after issuance, and makes role
///    revocation effective on the next request.
///
/// Rejection: an `ApiError` that renders as a generic 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // The two dependencies the gate pulls from state: the identity store and the
    // token service carrying the signing secret.
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Reuse a decision made upstream in the same request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        // 2. Credential Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingCredential)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingCredential)?;

        if token.is_empty() {
            return Err(ApiError::MissingCredential);
        }

        // 3. Token Verification
        let subject = tokens.verify(token).map_err(ApiError::InvalidCredential)?;

        // 4. Identity Resolution (Final Verification)
        // The role is always read from the store, never trusted from the token, so a
        // demoted or deleted user loses access on their next request.
        let user = repo
            .find_user_by_id(subject)
            .await
            .ok_or(ApiError::UnknownSubject)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// authenticate
///
/// Login-time credential check. Looks the user up by exact email match and verifies
/// the password against the stored hash. An unknown email and a wrong password
/// produce the *same* `InvalidCredentials` error so the two cases cannot be
/// distinguished from outside. A malformed stored hash is an infrastructure failure
/// and surfaces as a 500, never as a credential rejection.
pub async fn authenticate(
    repo: &RepositoryState,
    hasher: &CredentialHasher,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let Some(user) = repo.find_user_by_email(email).await else {
        return Err(ApiError::InvalidCredentials);
    };

    match hasher.verify(&user.password_hash, password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(ApiError::InvalidCredentials),
        Err(e) => Err(ApiError::Hashing(e)),
    }
}
