//! Vision-model helpers for payment screenshots and student ID cards.
//!
//! Both checks call an OpenAI-compatible chat completions endpoint with an inline image and ask
//! for a small JSON object back. Everything returned here is advisory. The extracted values are
//! shown to the admin next to the proof; they never decide a verification on their own.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use gp_common::Rupees;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::VisionConfig;

#[derive(Debug, Clone, Error)]
pub enum VisionApiError {
    #[error("Could not initialize the vision client. {0}")]
    Initialization(String),
    #[error("Error communicating with the vision service. {0}")]
    RestResponseError(String),
    #[error("The vision service returned an error. {status}: {message}")]
    QueryError { status: u16, message: String },
    #[error("The vision service reply could not be used. {0}")]
    UnusableReply(String),
}

/// What the model read off a payment screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtrExtraction {
    /// The 12-digit UTR reference, if one was legible.
    pub utr_number: Option<String>,
    /// The paid amount, in whole rupees, if legible.
    pub extracted_amount: Option<Rupees>,
    /// The payment date as printed on the screenshot.
    pub extracted_date: Option<String>,
}

/// What the model read off a student ID card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentIdCheck {
    pub name: Option<String>,
    pub college: Option<String>,
    pub valid_till_year: Option<i32>,
    /// True when the card shows a validity year at or after the current year.
    pub eligible: bool,
}

/// The seam the vision routes use, so that endpoint tests can stand in a mock.
#[allow(async_fn_in_trait)]
pub trait VisionExtractor {
    async fn extract_utr(&self, image_b64: &str, mime_type: &str) -> Result<UtrExtraction, VisionApiError>;
    async fn verify_student_id(&self, image_b64: &str, mime_type: &str) -> Result<StudentIdCheck, VisionApiError>;
}

const UTR_PROMPT: &str = "This is a screenshot of a UPI payment. Reply with only a JSON object with keys utr_number \
                          (the 12 digit UTR or reference number as a string, or null), amount (the paid amount in \
                          rupees as an integer, or null) and date (the payment date as YYYY-MM-DD, or null). No \
                          other text.";

const STUDENT_ID_PROMPT: &str = "This is a photo of a student ID card. Reply with only a JSON object with keys name \
                                 (the student's name, or null), college (the institution name, or null) and \
                                 valid_till_year (the final year the card is valid, as an integer, or null). No \
                                 other text.";

#[derive(Clone)]
pub struct HttpVisionExtractor {
    config: VisionConfig,
    client: Arc<Client>,
}

impl HttpVisionExtractor {
    pub fn new(config: VisionConfig) -> Result<Self, VisionApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| VisionApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| VisionApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends the image with a prompt and parses the JSON object out of the reply.
    async fn ask_about_image(&self, prompt: &str, image_b64: &str, mime_type: &str) -> Result<Value, VisionApiError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": format!("data:{mime_type};base64,{image_b64}") } },
                ],
            }],
            "max_tokens": 200,
        });
        trace!("📷️ Sending a vision query to {}", self.config.api_url);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| VisionApiError::RestResponseError(e.to_string()))?;
            return Err(VisionApiError::QueryError { status, message });
        }
        let reply = response.json::<Value>().await.map_err(|e| VisionApiError::RestResponseError(e.to_string()))?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| VisionApiError::UnusableReply("the reply has no message content".to_string()))?;
        let content = strip_code_fences(content);
        serde_json::from_str::<Value>(content)
            .map_err(|e| VisionApiError::UnusableReply(format!("the reply is not valid JSON: {e}")))
    }
}

impl VisionExtractor for HttpVisionExtractor {
    async fn extract_utr(&self, image_b64: &str, mime_type: &str) -> Result<UtrExtraction, VisionApiError> {
        let fields = self.ask_about_image(UTR_PROMPT, image_b64, mime_type).await?;
        let utr_number = fields["utr_number"].as_str().and_then(normalise_utr);
        // Models answer with a number or a string for the amount, depending on their mood.
        let extracted_amount = match &fields["amount"] {
            Value::Number(n) => n.as_i64().map(Rupees::from),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Rupees::from),
            _ => None,
        };
        let extracted_date = fields["date"].as_str().map(|s| s.to_string());
        debug!("📷️ Read UTR {utr_number:?} and amount {extracted_amount:?} off a payment screenshot");
        Ok(UtrExtraction { utr_number, extracted_amount, extracted_date })
    }

    async fn verify_student_id(&self, image_b64: &str, mime_type: &str) -> Result<StudentIdCheck, VisionApiError> {
        let fields = self.ask_about_image(STUDENT_ID_PROMPT, image_b64, mime_type).await?;
        let name = fields["name"].as_str().map(|s| s.to_string());
        let college = fields["college"].as_str().map(|s| s.to_string());
        let valid_till_year = fields["valid_till_year"].as_i64().and_then(|y| i32::try_from(y).ok());
        let eligible = is_eligible(valid_till_year, Utc::now().year());
        debug!("📷️ Student ID check: name={name:?}, college={college:?}, valid till {valid_till_year:?}");
        Ok(StudentIdCheck { name, college, valid_till_year, eligible })
    }
}

/// Models often wrap JSON replies in markdown code fences despite being told not to.
fn strip_code_fences(reply: &str) -> &str {
    let reply = reply.trim();
    let reply = reply.strip_prefix("```json").or_else(|| reply.strip_prefix("```")).unwrap_or(reply);
    let reply = reply.strip_suffix("```").unwrap_or(reply);
    reply.trim()
}

/// UTR references are 12 digits. Models pad them with spaces or prose at times; keep the digits
/// and accept the result only if exactly 12 remain.
fn normalise_utr(raw: &str) -> Option<String> {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    (digits.len() == 12).then_some(digits)
}

/// A card with no legible validity year is not eligible.
fn is_eligible(valid_till_year: Option<i32>, current_year: i32) -> bool {
    valid_till_year.map(|y| y >= current_year).unwrap_or(false)
}
