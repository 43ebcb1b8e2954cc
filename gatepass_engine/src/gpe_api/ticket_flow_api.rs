use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{GateEntry, NewTicket, Ticket, TicketId, TicketStatus},
    gpe_api::ticket_objects::ScanDecision,
    traits::{TicketStore, TicketStoreError},
};

/// The number of fresh ids to try before giving up on a ticket insert. Collisions on an
/// eight-character alphanumeric id are vanishingly rare; hitting this limit means something else
/// is wrong.
const MAX_ID_ATTEMPTS: usize = 5;

/// `TicketFlowApi` is the primary API for moving tickets through their lifecycle, from purchase through payment
/// verification to redemption at the gate.
///
/// The status transitions it permits are summarised in this table:
///
/// | From \ To | Pending | Verified | Rejected | Used |
/// |-----------|---------|----------|----------|------|
/// | (new)     | 1       | 2        | Err      | Err  |
/// | Pending   | Err     | 3        | 3        | Err  |
/// | Verified  | Err     | Err      | Err      | 4    |
/// | Rejected  | Err     | Err      | Err      | Err  |
/// | Used      | Err     | Err      | Err      | Err  |
///
/// 1. [`Self::create_ticket`]: a purchase backed by an uploaded payment proof.
/// 2. [`Self::create_verified_ticket`]: a gateway purchase whose payment signature the caller has already verified.
/// 3. [`Self::verify_ticket`] / [`Self::reject_ticket`]: an admin ruling on the payment proof.
/// 4. [`Self::confirm_entry`]: redemption at the gate.
///
/// `Rejected` and `Used` are terminal. Anything not in the table fails with
/// [`TicketStoreError::InvalidTransition`] and leaves the row untouched.
#[derive(Clone)]
pub struct TicketFlowApi<B> {
    db: B,
}

impl<B> Debug for TicketFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketFlowApi")
    }
}

impl<B> TicketFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TicketFlowApi<B>
where B: TicketStore
{
    /// Creates a new `Pending` ticket for a purchase backed by an uploaded payment proof.
    /// An admin must verify the proof before the ticket becomes admissible.
    pub async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketStoreError> {
        let ticket = self.create_with_status(ticket, TicketStatus::Pending).await?;
        debug!("🎫️📦️ Ticket [{}] created for {}. Awaiting payment verification.", ticket.ticket_id, ticket.name);
        Ok(ticket)
    }

    /// Creates a new `Verified` ticket for a purchase that came in through the payment gateway.
    ///
    /// Callers must have checked the gateway's payment signature before calling this; the engine
    /// takes their word for it.
    pub async fn create_verified_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketStoreError> {
        let ticket = self.create_with_status(ticket, TicketStatus::Verified).await?;
        info!("🎫️📦️ Ticket [{}] created for {} via gateway payment. Ready for entry.", ticket.ticket_id, ticket.name);
        Ok(ticket)
    }

    async fn create_with_status(&self, ticket: NewTicket, status: TicketStatus) -> Result<Ticket, TicketStoreError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let ticket_id = TicketId::random();
            match self.db.insert_ticket(ticket.clone(), &ticket_id, status).await {
                Err(TicketStoreError::TicketAlreadyExists(id)) => {
                    warn!("🎫️📦️ Freshly generated ticket id [{id}] collided with an existing ticket. Trying again.");
                },
                result => return result,
            }
        }
        Err(TicketStoreError::DatabaseError(format!(
            "Could not generate a unique ticket id in {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Marks a `Pending` ticket as `Verified`. An admin has looked at the payment proof and is
    /// satisfied that the money arrived.
    pub async fn verify_ticket(&self, ticket_id: &TicketId) -> Result<Ticket, TicketStoreError> {
        match self.db.update_status_if(ticket_id, TicketStatus::Pending, TicketStatus::Verified).await? {
            Some(ticket) => {
                info!("🎫️✅️ Ticket [{ticket_id}] has been verified.");
                Ok(ticket)
            },
            None => Err(self.transition_failure(ticket_id, TicketStatus::Verified).await),
        }
    }

    /// Marks a `Pending` ticket as `Rejected`. Terminal; there is no path back.
    pub async fn reject_ticket(&self, ticket_id: &TicketId) -> Result<Ticket, TicketStoreError> {
        match self.db.update_status_if(ticket_id, TicketStatus::Pending, TicketStatus::Rejected).await? {
            Some(ticket) => {
                info!("🎫️❌️ Ticket [{ticket_id}] has been rejected.");
                Ok(ticket)
            },
            None => Err(self.transition_failure(ticket_id, TicketStatus::Rejected).await),
        }
    }

    /// Scans a ticket at the gate. This is a pure read; whatever the outcome, nothing about the
    /// ticket changes until [`Self::confirm_entry`] is called.
    pub async fn scan_ticket(&self, ticket_id: &TicketId) -> Result<ScanDecision, TicketStoreError> {
        let ticket = self.db.fetch_ticket_by_ticket_id(ticket_id).await?;
        let decision = ScanDecision::for_ticket(ticket.as_ref());
        debug!("🎫️🚪️ Scan of [{ticket_id}]: {}", decision.result_code());
        Ok(decision)
    }

    /// Confirms entry for a `Verified` ticket. The ticket is marked `Used`, `used_at` is set, and
    /// the entry is appended to the scan log, all in one atomic transaction. Exactly one of any
    /// number of racing confirm calls for the same ticket succeeds.
    pub async fn confirm_entry(&self, ticket_id: &TicketId, entry: GateEntry) -> Result<Ticket, TicketStoreError> {
        match self.db.redeem_ticket(ticket_id, entry).await? {
            Some(ticket) => {
                info!("🎫️🚪️ Ticket [{ticket_id}] redeemed. {} has entered.", ticket.name);
                Ok(ticket)
            },
            None => Err(self.transition_failure(ticket_id, TicketStatus::Used).await),
        }
    }

    /// Fetches a ticket by its public id.
    pub async fn ticket_by_id(&self, ticket_id: &TicketId) -> Result<Option<Ticket>, TicketStoreError> {
        self.db.fetch_ticket_by_ticket_id(ticket_id).await
    }

    /// Fetches tickets, optionally filtered by status, newest first.
    pub async fn tickets_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, TicketStoreError> {
        self.db.fetch_tickets_by_status(status).await
    }

    /// Works out why a conditional update matched nothing. The row is re-fetched; a missing row is
    /// `TicketNotFound` and anything else is an `InvalidTransition` carrying the actual status.
    /// If the status changes between the update and this fetch, the reported `from` status is
    /// simply the newer one, and that transition is just as invalid.
    async fn transition_failure(&self, ticket_id: &TicketId, to: TicketStatus) -> TicketStoreError {
        match self.db.fetch_ticket_by_ticket_id(ticket_id).await {
            Ok(Some(ticket)) => {
                TicketStoreError::InvalidTransition { ticket_id: ticket_id.clone(), from: ticket.status, to }
            },
            Ok(None) => TicketStoreError::TicketNotFound(ticket_id.clone()),
            Err(e) => e,
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
