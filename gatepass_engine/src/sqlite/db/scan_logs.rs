//! The append-only gate entry log.
//!
//! Rows are only ever inserted, and only from within the redemption transaction. Nothing in the
//! engine reads them back; they exist for post-event auditing with external tools.
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{GateEntry, TicketId};

pub async fn insert_scan_log(
    ticket_id: &TicketId,
    scan_result: &str,
    entry: &GateEntry,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO scan_logs (ticket_id, scan_result, gate_id, device_id)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(ticket_id.as_str())
    .bind(scan_result)
    .bind(entry.gate_id.as_deref())
    .bind(entry.device_id.as_deref())
    .execute(conn)
    .await?;
    debug!("📝️ {scan_result} entry logged for ticket [{ticket_id}]");
    Ok(())
}
