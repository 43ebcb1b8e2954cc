//! Access tokens for the admin console and the gate scanners.
//!
//! Staff log in with an email OTP (see [`crate::integrations::IdentityProvider`]). On a successful
//! OTP check the server issues a short-lived HS256 JWT carrying the email and the roles persisted
//! for it. Every protected route validates the token in [`crate::middleware::JwtMiddlewareFactory`]
//! and then checks the role claims in [`crate::middleware::AclMiddlewareFactory`].

use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use gatepass_engine::db_types::{EmailAddress, Roles};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The email address the OTP was verified against.
    pub sub: EmailAddress,
    pub roles: Roles,
    pub iat: i64,
    pub exp: i64,
}

/// Lets handlers take `JwtClaims` as an argument. The claims are placed in the request extensions
/// by the JWT middleware, so this only works on routes inside a protected scope.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(ServerError::CouldNotDeserializeAuthToken);
        ready(claims)
    }
}

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer_token(req: &HttpRequest) -> Result<String, ServerError> {
    let header = req.headers().get(AUTH_HEADER).ok_or(ServerError::CouldNotDeserializeAuthToken)?;
    let header = header.to_str().map_err(|_| ServerError::CouldNotDeserializeAuthToken)?;
    let token = header.strip_prefix(BEARER_PREFIX).ok_or(ServerError::CouldNotDeserializeAuthToken)?;
    Ok(token.trim().to_string())
}

/// Validate an access token and return its claims. Expiry is checked by the `jsonwebtoken`
/// validation rules.
pub fn validate_access_token(token: &str, decoding_key: &DecodingKey) -> Result<JwtClaims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<JwtClaims>(token, decoding_key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidToken |
        jsonwebtoken::errors::ErrorKind::Base64(_) |
        jsonwebtoken::errors::ErrorKind::Json(_) |
        jsonwebtoken::errors::ErrorKind::Utf8(_) => AuthError::PoorlyFormattedToken(format!("{e}")),
        _ => AuthError::ValidationError(format!("{e}")),
    })?;
    debug!("🔑️ Access token validated for {}", data.claims.sub);
    Ok(data.claims)
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    validity: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { encoding_key, validity: config.token_validity }
    }

    /// Issue a new access token for the given email and roles.
    ///
    /// This method DOES NOT check that the caller is entitled to the roles. The OTP check and the
    /// role lookup must happen before `issue_token` is called.
    pub fn issue_token(&self, email: &EmailAddress, roles: Roles) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: email.clone(),
            roles,
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }
}
