//! GatePass Engine
//!
//! The GatePass Engine is the backend for an event ticketing service: it sells tickets against manual payment proofs
//! or gateway payments, lets admins verify those proofs, and redeems tickets at the gate on event day.
//! This library contains the core logic for the ticketing engine. It is server-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`] and the [`mod@traits`] it implements). Currently, Sqlite is the
//!    supported backend. You should never need to access the database directly. Instead, use the public API provided
//!    by the engine. The exception is the data types used in the database. These are defined in the `db_types` module
//!    and are public.
//! 2. The engine public API ([`mod@gpe_api`]). This provides the public-facing functionality of the ticketing engine.
//!    It is responsible for the ticket lifecycle, gate scanning and authorisation roles. Specific backends need to
//!    implement the traits in this module in order to act as a backend for the GatePass Server.
pub mod db_types;
mod gpe_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use gpe_api::{auth_api::AuthApi, ticket_flow_api::TicketFlowApi, ticket_objects};
pub use traits::{AuthApiError, AuthManagement, TicketStore, TicketStoreError};
