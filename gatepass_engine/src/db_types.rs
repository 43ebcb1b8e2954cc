use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gp_common::Rupees;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       TicketId      ---------------------------------------------------------

/// The number of characters in a ticket id.
pub const TICKET_ID_LEN: usize = 8;

const TICKET_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The public identifier of a ticket. Eight uppercase alphanumeric characters, e.g. `7G2KQ9ZD`.
///
/// Ticket ids are generated randomly at purchase time and are the only identifier that ever
/// leaves the server. The integer row id stays internal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct TicketId(String);

#[derive(Debug, Clone, Error)]
#[error("Invalid ticket id: {0}")]
pub struct TicketIdError(String);

impl TicketId {
    /// Generates a new random ticket id from the uppercase alphanumeric alphabet.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..TICKET_ID_LEN)
            .map(|_| {
                let i = rng.gen_range(0..TICKET_ID_ALPHABET.len());
                TICKET_ID_ALPHABET[i] as char
            })
            .collect::<String>();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TicketId {
    type Err = TicketIdError;

    /// Parses a ticket id, trimming whitespace and folding to uppercase. Scanners are sloppy
    /// about case; the database is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_uppercase();
        let well_formed =
            id.len() == TICKET_ID_LEN && id.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !well_formed {
            return Err(TicketIdError(format!(
                "'{s}' is not {TICKET_ID_LEN} uppercase alphanumeric characters"
            )));
        }
        Ok(Self(id))
    }
}

impl TryFrom<String> for TicketId {
    type Error = TicketIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketId> for String {
    fn from(value: TicketId) -> Self {
        value.0
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     EmailAddress    ---------------------------------------------------------

/// A lightly validated email address, trimmed and lowercased so that login records and role
/// assignments agree on a canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

#[derive(Debug, Clone, Error)]
#[error("Invalid email address: {0}")]
pub struct EmailAddressError(String);

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EmailAddress {
    type Err = EmailAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = s.trim().to_lowercase();
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            },
            None => false,
        };
        if !well_formed || email.len() > 254 || email.contains(char::is_whitespace) {
            return Err(EmailAddressError(s.to_string()));
        }
        Ok(Self(email))
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    TicketStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    /// The ticket has been created and is waiting for an admin to check the payment proof.
    Pending,
    /// The payment has been confirmed, either by an admin or by the payment gateway.
    Verified,
    /// An admin rejected the payment proof. Terminal.
    Rejected,
    /// The holder has entered the venue. Terminal.
    Used,
}

impl TicketStatus {
    /// Terminal statuses never change again, no matter what arrives at the API.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Rejected | TicketStatus::Used)
    }
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Pending => write!(f, "PENDING"),
            TicketStatus::Verified => write!(f, "VERIFIED"),
            TicketStatus::Rejected => write!(f, "REJECTED"),
            TicketStatus::Used => write!(f, "USED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for TicketStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            "REJECTED" => Ok(Self::Rejected),
            "USED" => Ok(Self::Used),
            s => Err(ConversionError(format!("Invalid ticket status: {s}"))),
        }
    }
}

//--------------------------------------        Role         ---------------------------------------------------------

/// The roles that can be granted to an authenticated account. Tickets are bought anonymously;
/// roles only matter for the admin console and the gate scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
pub enum Role {
    /// Full access to the admin endpoints, including payment verification and role management.
    Admin,
    /// Gate staff can scan tickets and confirm entry, nothing else.
    GateStaff,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::GateStaff => write!(f, "GateStaff"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "gatestaff" | "gate_staff" => Ok(Self::GateStaff),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------       Ticket        ---------------------------------------------------------

/// A ticket row as stored in the database.
///
/// The holder details, the tier and the price are fixed at purchase time and never change.
/// Only `status` and `used_at` move, and only along the transitions that
/// [`TicketFlowApi`](crate::TicketFlowApi) allows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    /// Internal row id. Never leaves the server.
    #[serde(skip)]
    pub id: i64,
    pub ticket_id: TicketId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub ticket_type: String,
    pub price: Rupees,
    /// Where the payment proof lives. An uploaded screenshot URL, or a gateway reference for
    /// tickets paid through Razorpay.
    pub screenshot_url: String,
    /// The UTR the buyer claims to have paid with. Advisory only; no payment is verified
    /// against it.
    pub utr_number: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the ticket is redeemed at the gate.
    pub used_at: Option<DateTime<Utc>>,
}

//--------------------------------------      NewTicket      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    /// The name the ticket is issued to
    pub name: String,
    /// A contact number for the holder
    pub phone: String,
    /// A contact email for the holder
    pub email: String,
    /// The pass tier, e.g. `GOLD`. Free form, fixed at purchase
    pub ticket_type: String,
    /// The price payable for this ticket, in whole rupees
    pub price: Rupees,
    /// A reference to the payment proof
    pub screenshot_url: String,
    /// The transaction reference the buyer supplied, if any
    pub utr_number: Option<String>,
}

impl NewTicket {
    pub fn new(
        name: String,
        phone: String,
        email: String,
        ticket_type: String,
        price: Rupees,
        screenshot_url: String,
    ) -> Self {
        Self { name, phone, email, ticket_type, price, screenshot_url, utr_number: None }
    }

    pub fn with_utr_number(mut self, utr_number: String) -> Self {
        self.utr_number = Some(utr_number);
        self
    }
}

//--------------------------------------      GateEntry      ---------------------------------------------------------

/// Where, and on what device, a gate entry happened. Both fields are optional; the kiosks in the
/// field are not always configured with an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateEntry {
    pub gate_id: Option<String>,
    pub device_id: Option<String>,
}

impl GateEntry {
    pub fn new(gate_id: Option<String>, device_id: Option<String>) -> Self {
        Self { gate_id, device_id }
    }
}

//--------------------------------------       ScanLog       ---------------------------------------------------------

/// The result code recorded against a successful gate entry.
pub const SCAN_RESULT_VALID: &str = "VALID";

/// An append-only record of a gate entry. Rows are written when entry is confirmed and are never
/// read back by the service; they exist for post-event auditing.
#[derive(Debug, Clone, FromRow)]
pub struct ScanLog {
    pub id: i64,
    pub ticket_id: TicketId,
    pub scan_result: String,
    pub gate_id: Option<String>,
    pub device_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     AuthAccount     ---------------------------------------------------------

/// A login record for an email address that has authenticated at least once.
#[derive(Debug, Clone, FromRow)]
pub struct AuthAccount {
    pub id: i64,
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub login_count: i64,
}
