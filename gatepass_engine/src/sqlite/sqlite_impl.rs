//! `SqliteDatabase` is a concrete implementation of a GatePass engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`](crate::traits)
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{auth, db_url, new_pool, scan_logs, tickets};
use crate::{
    db_types::{
        AuthAccount,
        EmailAddress,
        GateEntry,
        NewTicket,
        Role,
        Roles,
        Ticket,
        TicketId,
        TicketStatus,
        SCAN_RESULT_VALID,
    },
    traits::{AuthApiError, AuthManagement, TicketStore, TicketStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl TicketStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_ticket(
        &self,
        ticket: NewTicket,
        ticket_id: &TicketId,
        initial_status: TicketStatus,
    ) -> Result<Ticket, TicketStoreError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::insert_ticket(ticket, ticket_id, initial_status, &mut conn).await?;
        debug!("🗃️ Ticket [{}] has been saved in the DB with status {}", ticket.ticket_id, ticket.status);
        Ok(ticket)
    }

    async fn fetch_ticket_by_ticket_id(&self, ticket_id: &TicketId) -> Result<Option<Ticket>, TicketStoreError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket_by_ticket_id(ticket_id, &mut conn).await?;
        Ok(ticket)
    }

    async fn fetch_tickets_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, TicketStoreError> {
        let mut conn = self.pool.acquire().await?;
        let tickets = tickets::fetch_tickets_by_status(status, &mut conn).await?;
        Ok(tickets)
    }

    async fn update_status_if(
        &self,
        ticket_id: &TicketId,
        expected: TicketStatus,
        new_status: TicketStatus,
    ) -> Result<Option<Ticket>, TicketStoreError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::update_status_if(ticket_id, expected, new_status, &mut conn).await?;
        match &ticket {
            Some(t) => debug!("🗃️ Ticket [{ticket_id}] moved from {expected} to {}", t.status),
            None => debug!("🗃️ Ticket [{ticket_id}] was not in {expected} status. No changes made."),
        }
        Ok(ticket)
    }

    /// Redeems a ticket at the gate. In a single atomic transaction, the ticket is moved from `Verified` to
    /// `Used` with a conditional update, `used_at` is stamped, and the entry is appended to the scan log.
    /// The conditional update matching zero rows is the normal "not eligible" outcome, not an error.
    async fn redeem_ticket(&self, ticket_id: &TicketId, entry: GateEntry) -> Result<Option<Ticket>, TicketStoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(ticket) = tickets::redeem_ticket(ticket_id, &mut tx).await? else {
            debug!("🗃️ Ticket [{ticket_id}] is not eligible for entry. No changes made.");
            return Ok(None);
        };
        scan_logs::insert_scan_log(ticket_id, SCAN_RESULT_VALID, &entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Ticket [{ticket_id}] has been redeemed at the gate. The entry is logged.");
        Ok(Some(ticket))
    }

    async fn close(&mut self) -> Result<(), TicketStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AuthManagement for SqliteDatabase {
    async fn upsert_auth_account(&self, email: &EmailAddress) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::upsert_auth_account(email, &mut conn).await
    }

    async fn fetch_roles_for_email(&self, email: &EmailAddress) -> Result<Roles, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        let roles = auth::roles_for_email(email, &mut conn).await?;
        Ok(roles)
    }

    async fn assign_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut tx = self.pool.begin().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::assign_roles(email, roles, &mut tx).await?;
        tx.commit().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        debug!("🔑️ Roles {roles:?} assigned to {email}");
        Ok(())
    }

    async fn remove_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::remove_roles(email, roles, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Fetches the login record for the given email, if one exists.
    pub async fn fetch_auth_account(&self, email: &EmailAddress) -> Result<Option<AuthAccount>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::fetch_auth_account(email, &mut conn).await
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
