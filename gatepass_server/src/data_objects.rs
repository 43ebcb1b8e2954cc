//! Request and response bodies for the REST endpoints.
//!
//! Requests are deserialized into typed structs and validated here, at the edge, so that handlers
//! and the engine only ever see well-formed data. Validation failures map to 400s via
//! [`ServerError::InvalidRequestBody`].

use std::fmt::Display;

use gatepass_engine::{
    db_types::{EmailAddress, NewTicket, Role, Roles, TicketId, TicketStatus},
    ticket_objects::{ScanDecision, TicketProjection},
};
use gp_common::Rupees;
use razorpay_tools::{OrderNotes, PaymentSignature};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

//--------------------------------------    Ticket purchase    -------------------------------------------------------

/// The body of a manual-payment ticket purchase. The buyer has already paid by UPI and uploaded a
/// screenshot of the payment; the ticket starts out unverified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub ticket_type: String,
    /// The price paid, in whole rupees.
    pub price: Rupees,
    /// A link to the uploaded payment screenshot.
    pub screenshot_url: String,
    /// The UPI transaction reference the buyer typed in, if any. Informational only.
    #[serde(default)]
    pub utr_number: Option<String>,
}

impl TicketRequest {
    /// Checks and normalises the request, producing the record the engine will store.
    pub fn validate(self) -> Result<NewTicket, ServerError> {
        let name = required_text(&self.name, "name")?;
        let ticket_type = required_text(&self.ticket_type, "ticket_type")?;
        let screenshot_url = required_text(&self.screenshot_url, "screenshot_url")?;
        let email =
            self.email.parse::<EmailAddress>().map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        let phone = validate_phone(&self.phone)?;
        if !self.price.is_positive() {
            return Err(ServerError::InvalidRequestBody("price must be a positive number of rupees".to_string()));
        }
        let mut ticket = NewTicket::new(name, phone, email.into(), ticket_type, self.price, screenshot_url);
        if let Some(utr) = self.utr_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            ticket = ticket.with_utr_number(utr.to_string());
        }
        Ok(ticket)
    }
}

fn required_text(value: &str, field: &str) -> Result<String, ServerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServerError::InvalidRequestBody(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// Accepts phone numbers as people actually type them (spaces, dashes, an optional leading `+`)
/// and stores the compacted form.
fn validate_phone(phone: &str) -> Result<String, ServerError> {
    let cleaned = phone.chars().filter(|c| !matches!(c, ' ' | '-')).collect::<String>();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || !(10..=14).contains(&digits.len()) {
        return Err(ServerError::InvalidRequestBody(format!("'{phone}' is not a valid phone number")));
    }
    Ok(cleaned)
}

//--------------------------------------    Admin review    ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerifyAction {
    Verify,
    Reject,
}

/// An admin's decision on a pending payment proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminVerifyRequest {
    pub ticket_id: TicketId,
    pub action: VerifyAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFilter {
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub email: String,
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

//--------------------------------------    Gate scanning    ---------------------------------------------------------

/// A scanned ticket id, plus where it was scanned. The id is deliberately a raw string rather
/// than a [`TicketId`]: a malformed scan is an answer ("Invalid Ticket"), not a request error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub ticket_id: String,
    #[serde(default)]
    pub gate_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub result: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketProjection>,
}

impl ScanResponse {
    pub fn invalid() -> Self {
        Self::from(ScanDecision::Invalid)
    }
}

impl From<ScanDecision> for ScanResponse {
    fn from(decision: ScanDecision) -> Self {
        let result = decision.result_code().to_string();
        let message = decision.message().to_string();
        let ticket = match decision {
            ScanDecision::Verified(projection) => Some(projection),
            _ => None,
        };
        Self { result, message, ticket }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: String,
    pub ticket: TicketProjection,
}

//--------------------------------------    Razorpay checkout    -----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// The order amount, in whole rupees.
    pub amount: Rupees,
    pub ticket_type: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if !self.amount.is_positive() {
            return Err(ServerError::InvalidRequestBody("amount must be a positive number of rupees".to_string()));
        }
        if self.ticket_type.trim().is_empty() {
            return Err(ServerError::InvalidRequestBody("ticket_type must not be empty".to_string()));
        }
        Ok(())
    }
}

impl From<&CreateOrderRequest> for OrderNotes {
    fn from(req: &CreateOrderRequest) -> Self {
        OrderNotes {
            ticket_type: Some(req.ticket_type.clone()),
            customer_name: req.customer_name.clone(),
            customer_email: req.customer_email.clone(),
            customer_phone: req.customer_phone.clone(),
        }
    }
}

/// Everything the frontend needs to open the Razorpay checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// The order amount in paise, as Razorpay checkout expects it.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// The callback Razorpay checkout fires after a successful payment, plus the buyer details the
/// frontend collected. The signature is checked before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub ticket_type: String,
    pub price: Rupees,
}

impl VerifyPaymentRequest {
    pub fn signature(&self) -> PaymentSignature {
        PaymentSignature::new(&self.razorpay_order_id, &self.razorpay_payment_id, &self.razorpay_signature)
    }

    /// Converts a signature-checked payment into the ticket record. The payment id stands in for
    /// a screenshot, and the order id is kept as the payment reference.
    pub fn into_ticket(self) -> Result<NewTicket, ServerError> {
        let request = TicketRequest {
            name: self.name,
            phone: self.phone,
            email: self.email,
            ticket_type: self.ticket_type,
            price: self.price,
            screenshot_url: format!("razorpay://{}", self.razorpay_payment_id),
            utr_number: Some(self.razorpay_order_id),
        };
        request.validate()
    }
}

//--------------------------------------    Staff login    -----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub email: EmailAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: EmailAddress,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub roles: Roles,
}

//--------------------------------------    Vision uploads    --------------------------------------------------------

/// An uploaded image for the vision endpoints, base64 encoded without a data-url prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub image_b64: String,
    pub mime_type: String,
}

//--------------------------------------    Generic envelope    ------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
