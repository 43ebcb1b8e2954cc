use thiserror::Error;

use crate::db_types::{GateEntry, NewTicket, Ticket, TicketId, TicketStatus};

/// This trait defines the storage behaviour for backends supporting the GatePass engine.
///
/// The status field of a ticket moves along a small, one-way state machine:
///
/// ```text
///             ┌─────────┐ admin verify ┌──────────┐ confirm entry ┌──────┐
///  create ──> │ PENDING │ ───────────> │ VERIFIED │ ────────────> │ USED │
///             └─────────┘              └──────────┘               └──────┘
///                  │                        ^
///                  │ admin reject           │ gateway payment (signature checked upstream)
///                  v                        │
///             ┌──────────┐              creation
///             │ REJECTED │
///             └──────────┘
/// ```
///
/// `REJECTED` and `USED` are terminal. Every state change goes through a conditional update that
/// names the expected current status, so a row that has already moved on is left untouched and
/// the caller is told so. Backends never mutate a ticket on a failed transition.
#[allow(async_fn_in_trait)]
pub trait TicketStore {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a new ticket with the given id and initial status.
    ///
    /// The initial status is `Pending` for manual-proof purchases and `Verified` for purchases
    /// that came in through the payment gateway with a valid signature. If a ticket with the same
    /// id already exists, [`TicketStoreError::TicketAlreadyExists`] is returned and the caller
    /// can retry with a fresh id.
    async fn insert_ticket(
        &self,
        ticket: NewTicket,
        ticket_id: &TicketId,
        initial_status: TicketStatus,
    ) -> Result<Ticket, TicketStoreError>;

    /// Fetches the ticket with the given id, or `None` if it does not exist.
    async fn fetch_ticket_by_ticket_id(&self, ticket_id: &TicketId) -> Result<Option<Ticket>, TicketStoreError>;

    /// Fetches all tickets with the given status, or every ticket if no status is given.
    /// Tickets are returned newest first.
    async fn fetch_tickets_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, TicketStoreError>;

    /// Moves the ticket from `expected` status to `new_status` in a single conditional update.
    ///
    /// If the ticket is missing, or is not currently in `expected` status, no row is touched and
    /// `None` is returned. The caller decides whether that is a missing ticket or an illegal
    /// transition; [`crate::TicketFlowApi`] re-fetches the row to find out.
    async fn update_status_if(
        &self,
        ticket_id: &TicketId,
        expected: TicketStatus,
        new_status: TicketStatus,
    ) -> Result<Option<Ticket>, TicketStoreError>;

    /// Redeems a ticket at the gate. In a single atomic transaction,
    /// * the ticket is moved from `Verified` to `Used` with a conditional update,
    /// * `used_at` is set to the current time,
    /// * a scan log row is appended recording the entry.
    ///
    /// If the conditional update matches no row (missing ticket, or any status other than
    /// `Verified`), nothing is written and `None` is returned. Two racing calls for the same
    /// ticket therefore produce exactly one `Some`.
    async fn redeem_ticket(&self, ticket_id: &TicketId, entry: GateEntry) -> Result<Option<Ticket>, TicketStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), TicketStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum TicketStoreError {
    #[error("We have an internal database error (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert ticket, since it already exists with id {0}")]
    TicketAlreadyExists(TicketId),
    #[error("The requested ticket {0} does not exist")]
    TicketNotFound(TicketId),
    #[error("Ticket {ticket_id} cannot move from {from} to {to}")]
    InvalidTransition { ticket_id: TicketId, from: TicketStatus, to: TicketStatus },
}

impl From<sqlx::Error> for TicketStoreError {
    fn from(e: sqlx::Error) -> Self {
        TicketStoreError::DatabaseError(e.to_string())
    }
}
