use chrono::{DateTime, Utc};
use gp_common::Rupees;
use serde::{Deserialize, Serialize};

use crate::db_types::{Ticket, TicketId, TicketStatus};

//--------------------------------------    PublicTicket     ---------------------------------------------------------

/// The projection of a ticket that anyone holding the ticket id may see. Contact details and the
/// payment proof stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTicket {
    pub ticket_id: TicketId,
    pub name: String,
    pub ticket_type: String,
    pub status: TicketStatus,
    pub price: Rupees,
    pub created_at: DateTime<Utc>,
}

impl From<Ticket> for PublicTicket {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            name: ticket.name,
            ticket_type: ticket.ticket_type,
            status: ticket.status,
            price: ticket.price,
            created_at: ticket.created_at,
        }
    }
}

//--------------------------------------  TicketProjection   ---------------------------------------------------------

/// What the gate display shows for an admissible ticket. Enough to greet the holder and check
/// the tier wristband, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketProjection {
    pub ticket_id: TicketId,
    pub name: String,
    pub ticket_type: String,
}

impl From<&Ticket> for TicketProjection {
    fn from(ticket: &Ticket) -> Self {
        Self { ticket_id: ticket.ticket_id.clone(), name: ticket.name.clone(), ticket_type: ticket.ticket_type.clone() }
    }
}

//--------------------------------------    ScanDecision     ---------------------------------------------------------

/// The outcome of scanning a ticket at the gate.
///
/// Scanning is a pure read. The decision is derived entirely from the current status of the
/// ticket; nothing changes until a separate confirm call redeems it. Every variant maps to a
/// fixed result code and a fixed operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    /// The id is malformed, or no such ticket exists. The two cases are deliberately
    /// indistinguishable to whoever is probing ids at the gate.
    Invalid,
    /// The ticket exists but its payment has not been verified.
    Pending,
    /// The payment proof was rejected by an admin.
    Rejected,
    /// The ticket has already been used to enter.
    Used,
    /// The ticket is good for entry. Carries what the gate display shows.
    Verified(TicketProjection),
}

impl ScanDecision {
    /// Derives the decision from a lookup result. `None` (no such ticket) folds into `Invalid`.
    pub fn for_ticket(ticket: Option<&Ticket>) -> Self {
        match ticket {
            None => ScanDecision::Invalid,
            Some(t) => match t.status {
                TicketStatus::Pending => ScanDecision::Pending,
                TicketStatus::Rejected => ScanDecision::Rejected,
                TicketStatus::Used => ScanDecision::Used,
                TicketStatus::Verified => ScanDecision::Verified(TicketProjection::from(t)),
            },
        }
    }

    /// The machine-readable result code.
    pub fn result_code(&self) -> &'static str {
        match self {
            ScanDecision::Invalid => "INVALID",
            ScanDecision::Pending => "PENDING",
            ScanDecision::Rejected => "REJECTED",
            ScanDecision::Used => "USED",
            ScanDecision::Verified(_) => "VERIFIED",
        }
    }

    /// The message shown to the gate operator.
    pub fn message(&self) -> &'static str {
        match self {
            ScanDecision::Invalid => "Invalid Ticket",
            ScanDecision::Pending => "Payment Not Verified",
            ScanDecision::Rejected => "Ticket Rejected",
            ScanDecision::Used => "Already Used",
            ScanDecision::Verified(_) => "Valid Ticket",
        }
    }

    /// Whether the ticket may be redeemed for entry.
    pub fn admits_entry(&self) -> bool {
        matches!(self, ScanDecision::Verified(_))
    }
}
