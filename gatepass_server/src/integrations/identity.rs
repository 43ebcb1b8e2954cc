//! Staff identity checks via a GoTrue-style OTP service.
//!
//! GatePass does not store passwords. Admins and gate staff log in by requesting a one-time code
//! that the identity service emails to them, and posting the code back. Only after the service
//! accepts the code does the server look up roles and issue an access token.

use std::sync::Arc;

use gatepass_engine::db_types::EmailAddress;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::json;
use thiserror::Error;

use crate::config::IdentityConfig;

#[derive(Debug, Clone, Error)]
pub enum IdentityApiError {
    #[error("Could not initialize the identity client. {0}")]
    Initialization(String),
    #[error("Error communicating with the identity service. {0}")]
    RestResponseError(String),
    #[error("The OTP was rejected. {0}")]
    OtpRejected(String),
    #[error("The identity service returned an error. {status}: {message}")]
    QueryError { status: u16, message: String },
}

/// The seam the login routes use, so that endpoint tests can stand in a mock.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Asks the identity service to email a one-time code to `email`.
    async fn send_otp(&self, email: &EmailAddress) -> Result<(), IdentityApiError>;
    /// Checks a one-time code. `Ok(())` means the caller controls the mailbox.
    async fn verify_otp(&self, email: &EmailAddress, otp: &str) -> Result<(), IdentityApiError>;
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    config: IdentityConfig,
    client: Arc<Client>,
}

impl HttpIdentityProvider {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(config.api_key.reveal())
            .map_err(|e| IdentityApiError::Initialization(e.to_string()))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IdentityApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn send_otp(&self, email: &EmailAddress) -> Result<(), IdentityApiError> {
        let body = json!({ "email": email, "create_user": true });
        debug!("🔑️ Requesting an OTP email for {email}");
        let response = self
            .client
            .post(self.url("/auth/v1/otp"))
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            info!("🔑️ OTP email queued for {email}");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IdentityApiError::RestResponseError(e.to_string()))?;
            Err(IdentityApiError::QueryError { status, message })
        }
    }

    async fn verify_otp(&self, email: &EmailAddress, otp: &str) -> Result<(), IdentityApiError> {
        let body = json!({ "type": "email", "email": email, "token": otp });
        debug!("🔑️ Verifying an OTP for {email}");
        let response = self
            .client
            .post(self.url("/auth/v1/verify"))
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            info!("🔑️ OTP accepted for {email}");
            Ok(())
        } else if status.is_client_error() {
            warn!("🔑️ OTP rejected for {email} ({status})");
            Err(IdentityApiError::OtpRejected("The code is wrong or has expired".to_string()))
        } else {
            let message = response.text().await.map_err(|e| IdentityApiError::RestResponseError(e.to_string()))?;
            Err(IdentityApiError::QueryError { status: status.as_u16(), message })
        }
    }
}
