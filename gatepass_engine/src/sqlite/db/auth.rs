//! Sqlite database operations for GatePass authentication
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`](crate::SqliteDatabase) struct instead.

use std::collections::HashMap;

use log::debug;
use sqlx::{QueryBuilder, Row, SqliteConnection};

use crate::{
    db_types::{AuthAccount, EmailAddress, Role},
    traits::AuthApiError,
};

/// Creates a login record for the email, or bumps the login count on the existing one.
pub async fn upsert_auth_account(email: &EmailAddress, conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    let res = sqlx::query(
        r#"INSERT INTO auth_accounts (email) VALUES ($1) ON CONFLICT(email) DO
    UPDATE SET last_login_at = CURRENT_TIMESTAMP, login_count = login_count + 1"#,
    )
    .bind(email.as_str())
    .execute(conn)
    .await?;
    debug!("🔑️ Login recorded for {email} ({} row affected)", res.rows_affected());
    Ok(())
}

pub async fn fetch_auth_account(
    email: &EmailAddress,
    conn: &mut SqliteConnection,
) -> Result<Option<AuthAccount>, AuthApiError> {
    let account = sqlx::query_as("SELECT * FROM auth_accounts WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub async fn roles_for_email(email: &EmailAddress, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"SELECT name FROM
            role_assignments JOIN roles ON role_assignments.role_id = roles.id
            WHERE email = $1"#,
    )
    .bind(email.as_str())
    .fetch_all(conn)
    .await
    .map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
    let roles =
        names.iter().map(|r| r.parse::<Role>().map_err(|_| AuthApiError::RoleNotFound)).collect::<Result<Vec<_>, _>>()?;
    Ok(roles)
}

async fn fetch_roles(conn: &mut SqliteConnection) -> Result<HashMap<Role, i64>, AuthApiError> {
    let rows = sqlx::query("SELECT id, name FROM roles").fetch_all(conn).await?;
    let roles = rows
        .iter()
        .map(|r| {
            let name = r.get::<String, _>("name");
            let id = r.get::<i64, _>("id");
            name.parse::<Role>().map(|role| (role, id)).map_err(|_| AuthApiError::RoleNotFound)
        })
        .collect::<Result<HashMap<_, _>, _>>()?;
    debug!("Fetched current roles table: {roles:?}");
    Ok(roles)
}

/// Grants the given roles to the email. Duplicate grants are ignored, which makes this function
/// idempotent.
pub async fn assign_roles(
    email: &EmailAddress,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let all_roles = fetch_roles(conn).await?;
    let role_ids =
        roles.iter().map(|r| all_roles.get(r).ok_or(AuthApiError::RoleNotFound).copied()).collect::<Result<Vec<i64>, _>>()?;

    let mut qb = QueryBuilder::new("INSERT OR IGNORE INTO role_assignments (email, role_id) VALUES ");
    let mut values = qb.separated(", ");
    for role_id in role_ids {
        values.push("(");
        values.push_bind_unseparated(email.as_str());
        values.push_unseparated(", ");
        values.push_bind_unseparated(role_id);
        values.push_unseparated(")");
    }
    qb.build().execute(conn).await?;
    Ok(())
}

/// Removes the given roles from the email. Returns the number of assignments actually deleted,
/// which is less than `roles.len()` when some of them were never granted.
pub async fn remove_roles(
    email: &EmailAddress,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<u64, AuthApiError> {
    if roles.is_empty() {
        return Ok(0);
    }
    let all_roles = fetch_roles(conn).await?;
    let role_ids =
        roles.iter().map(|r| all_roles.get(r).ok_or(AuthApiError::RoleNotFound).copied()).collect::<Result<Vec<i64>, _>>()?;

    let mut qb = QueryBuilder::new("DELETE FROM role_assignments WHERE email = ");
    qb.push_bind(email.as_str());
    qb.push(" AND role_id IN (");
    let mut values = qb.separated(", ");
    role_ids.iter().for_each(|id| {
        values.push_bind(*id);
    });
    qb.push(")");
    let res = qb.build().execute(conn).await?;

    Ok(res.rows_affected())
}
