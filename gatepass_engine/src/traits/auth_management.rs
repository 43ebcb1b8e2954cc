use thiserror::Error;

use crate::db_types::{EmailAddress, Role, Roles};

/// The `AuthManagement` trait defines behaviour for managing authentication and authorisation.
///
/// ## Authentication
/// Users authenticate with a one-time code sent to their email; the identity provider does the
/// actual verification and the server issues its own access token afterwards. This trait keeps
/// the server-side bookkeeping: a login record per email, and the set of roles that have been
/// granted to it.
///
/// Role grants are keyed on the canonical (lowercased) form of the email address, which
/// [`EmailAddress`] enforces at parse time.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Creates a login record for the given email, or touches the existing one by bumping its
    /// login count and last-login time.
    async fn upsert_auth_account(&self, email: &EmailAddress) -> Result<(), AuthApiError>;

    /// Fetches the roles granted to the given email. An email with no grants is not an error;
    /// the request succeeds and returns an empty vector.
    async fn fetch_roles_for_email(&self, email: &EmailAddress) -> Result<Roles, AuthApiError>;

    /// Grants the given roles to the email. This function must be idempotent; granting a role
    /// that is already held is not an error.
    async fn assign_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles from the email. The number of roles actually removed is returned.
    /// This function must be idempotent.
    async fn remove_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<u64, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested role does not exist")]
    RoleNotFound,
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
