use std::{env, io::Write};

use chrono::Duration;
use gatepass_engine::db_types::EmailAddress;
use gp_common::Secret;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use razorpay_tools::RazorpayConfig;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_GPS_HOST: &str = "127.0.0.1";
const DEFAULT_GPS_PORT: u16 = 8360;
const DEFAULT_TOKEN_VALIDITY: Duration = Duration::hours(24);
const DEFAULT_VISION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Razorpay credentials for the prepaid checkout flow.
    pub razorpay: RazorpayConfig,
    /// The OTP service that handles staff logins.
    pub identity: IdentityConfig,
    /// The vision model used for UTR extraction and student ID checks.
    pub vision: VisionConfig,
    /// Granted the Admin role at startup, so that a fresh database has at least one working admin
    /// login.
    pub initial_admin_email: Option<EmailAddress>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GPS_HOST.to_string(),
            port: DEFAULT_GPS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            razorpay: RazorpayConfig::default(),
            identity: IdentityConfig::default(),
            vision: VisionConfig::default(),
            initial_admin_email: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("GPS_HOST").ok().unwrap_or_else(|| DEFAULT_GPS_HOST.into());
        let port = env::var("GPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for GPS_PORT. {e} Using the default, {DEFAULT_GPS_PORT}, instead."
                    );
                    DEFAULT_GPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_GPS_PORT);
        let database_url = env::var("GPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ GPS_DATABASE_URL is not set. Please set it to the URL for the GatePass database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let razorpay = RazorpayConfig::new_from_env_or_default();
        let identity = IdentityConfig::from_env_or_default();
        let vision = VisionConfig::from_env_or_default();
        let initial_admin_email = env::var("GPS_INITIAL_ADMIN_EMAIL").ok().and_then(|s| {
            s.parse::<EmailAddress>().map_err(|e| warn!("🪛️ Ignoring GPS_INITIAL_ADMIN_EMAIL. {e}")).ok()
        });
        Self { host, port, database_url, auth, razorpay, identity, vision, initial_admin_email }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long an issued access token stays valid.
    pub token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since every staff login will be invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the GPS_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_validity: DEFAULT_TOKEN_VALIDITY }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let jwt_secret =
            env::var("GPS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [GPS_JWT_SECRET]")))?;
        let token_validity = env::var("GPS_JWT_VALIDITY_HOURS")
            .map_err(|_| {
                info!(
                    "🪛️ GPS_JWT_VALIDITY_HOURS is not set. Using the default value of {} hrs.",
                    DEFAULT_TOKEN_VALIDITY.num_hours()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for GPS_JWT_VALIDITY_HOURS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_TOKEN_VALIDITY);
        Ok(Self { jwt_secret: Secret::new(jwt_secret), token_validity })
    }
}

//-------------------------------------------------  IdentityConfig  ---------------------------------------------------
/// Connection details for the GoTrue-style service that emails login OTPs to staff.
#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
}

impl IdentityConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("GPS_IDENTITY_BASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ GPS_IDENTITY_BASE_URL is not set. Staff OTP logins will fail until it is configured.");
            String::default()
        });
        let api_key = env::var("GPS_IDENTITY_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ GPS_IDENTITY_API_KEY is not set. Staff OTP logins will fail until it is configured.");
            String::default()
        });
        Self { base_url: base_url.trim_end_matches('/').to_string(), api_key: Secret::new(api_key) }
    }
}

//-------------------------------------------------  VisionConfig  -----------------------------------------------------
/// Connection details for an OpenAI-compatible chat completions endpoint with vision support.
#[derive(Clone, Debug)]
pub struct VisionConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub model: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_VISION_API_URL.to_string(),
            api_key: Secret::default(),
            model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

impl VisionConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("GPS_VISION_API_URL").ok().unwrap_or_else(|| {
            info!("🪛️ GPS_VISION_API_URL is not set. Using the default, {DEFAULT_VISION_API_URL}.");
            DEFAULT_VISION_API_URL.into()
        });
        let api_key = env::var("GPS_VISION_API_KEY").ok().unwrap_or_else(|| {
            error!(
                "🪛️ GPS_VISION_API_KEY is not set. UTR extraction and student ID checks will fail until it is \
                 configured."
            );
            String::default()
        });
        let model = env::var("GPS_VISION_MODEL").ok().unwrap_or_else(|| DEFAULT_VISION_MODEL.into());
        Self { api_url, api_key: Secret::new(api_key), model }
    }
}
