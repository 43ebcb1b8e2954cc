use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewTicket, Ticket, TicketId, TicketStatus},
    traits::TicketStoreError,
};

/// Inserts a new ticket into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The `ticket_id` is supplied by the caller; if it collides with an existing row the unique
/// constraint fires and [`TicketStoreError::TicketAlreadyExists`] is returned so that the caller
/// can retry with a fresh id.
pub async fn insert_ticket(
    ticket: NewTicket,
    ticket_id: &TicketId,
    status: TicketStatus,
    conn: &mut SqliteConnection,
) -> Result<Ticket, TicketStoreError> {
    let inserted: Ticket = sqlx::query_as(
        r#"
            INSERT INTO tickets (
                ticket_id,
                name,
                phone,
                email,
                ticket_type,
                price,
                screenshot_url,
                utr_number,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(ticket_id.as_str())
    .bind(ticket.name)
    .bind(ticket.phone)
    .bind(ticket.email)
    .bind(ticket.ticket_type)
    .bind(ticket.price.value())
    .bind(ticket.screenshot_url)
    .bind(ticket.utr_number)
    .bind(status)
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(de) if de.is_unique_violation() => {
            TicketStoreError::TicketAlreadyExists(ticket_id.clone())
        },
        _ => e.into(),
    })?;
    debug!("📝️ Ticket [{ticket_id}] inserted with id {}", inserted.id);
    Ok(inserted)
}

/// Returns the ticket with the given `ticket_id`, if one exists.
pub async fn fetch_ticket_by_ticket_id(
    ticket_id: &TicketId,
    conn: &mut SqliteConnection,
) -> Result<Option<Ticket>, sqlx::Error> {
    let ticket = sqlx::query_as("SELECT * FROM tickets WHERE ticket_id = $1")
        .bind(ticket_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(ticket)
}

/// Fetches tickets with the given status, or every ticket if no status filter is given.
///
/// Resulting tickets are ordered newest first. `created_at` only has second resolution, so the
/// row id breaks ties.
pub async fn fetch_tickets_by_status(
    status: Option<TicketStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ticket>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM tickets");
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Ticket>();
    let tickets = query.fetch_all(conn).await?;
    trace!("📝️ Result of fetch_tickets_by_status: {} rows", tickets.len());
    Ok(tickets)
}

/// Moves the ticket from `expected` status to `new_status` in a single conditional update.
///
/// The status check lives in the `WHERE` clause, so a row that is not in `expected` status is
/// never touched, no matter how the callers race. `None` means the guard did not match; the
/// caller can re-fetch the row to find out why.
pub async fn update_status_if(
    ticket_id: &TicketId,
    expected: TicketStatus,
    new_status: TicketStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Ticket>, sqlx::Error> {
    let ticket = sqlx::query_as("UPDATE tickets SET status = $1 WHERE ticket_id = $2 AND status = $3 RETURNING *")
        .bind(new_status)
        .bind(ticket_id.as_str())
        .bind(expected)
        .fetch_optional(conn)
        .await?;
    Ok(ticket)
}

/// The gate-entry update. Flips a `VERIFIED` ticket to `USED` and stamps `used_at`, in one
/// conditional statement. Concurrent calls for the same ticket resolve to exactly one winner;
/// the losers match zero rows and get `None`.
pub async fn redeem_ticket(ticket_id: &TicketId, conn: &mut SqliteConnection) -> Result<Option<Ticket>, sqlx::Error> {
    let ticket = sqlx::query_as(
        r#"
            UPDATE tickets SET
                status = 'USED',
                used_at = CURRENT_TIMESTAMP
            WHERE ticket_id = $1 AND status = 'VERIFIED'
            RETURNING *;
        "#,
    )
    .bind(ticket_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(ticket)
}
