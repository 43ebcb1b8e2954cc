use std::fmt::Debug;

use log::debug;

use crate::{
    db_types::{EmailAddress, Role, Roles},
    traits::{AuthApiError, AuthManagement},
};

/// `AuthApi` wraps the login and role bookkeeping for authenticated accounts.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Records a successful login for the email and returns the roles granted to it. An email
    /// with no grants gets an empty role list; that is a valid login with no privileged access.
    pub async fn record_login(&self, email: &EmailAddress) -> Result<Roles, AuthApiError> {
        self.db.upsert_auth_account(email).await?;
        let roles = self.db.fetch_roles_for_email(email).await?;
        debug!("🔑️ {email} logged in with roles {roles:?}");
        Ok(roles)
    }

    /// Fetches the roles granted to the email, without recording a login.
    pub async fn roles_for_email(&self, email: &EmailAddress) -> Result<Roles, AuthApiError> {
        self.db.fetch_roles_for_email(email).await
    }

    /// Grants the given roles to the email. Idempotent.
    pub async fn assign_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.assign_roles(email, roles).await
    }

    /// Removes the given roles from the email, returning how many were actually removed.
    pub async fn remove_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<u64, AuthApiError> {
        self.db.remove_roles(email, roles).await
    }
}
