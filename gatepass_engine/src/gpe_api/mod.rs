//! # GatePass engine public API
//!
//! The `gpe_api` module exposes the programmatic API for the GatePass engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Or different parts (e.g. auth and ticketing) could be configured on different machines.
//!
//! * [`ticket_flow_api`] is the primary API for moving tickets through their lifecycle, from purchase through
//!   payment verification to redemption at the gate.
//! * [`auth_api`] manages login records, and user [`Role`](crate::db_types::Role) assignments.
//!
//! The other submodules in this module are support and utility functions and types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to scan a ticket at the gate:
//!
//! ```rust,ignore
//! use gatepass_engine::{SqliteDatabase, TicketFlowApi};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements TicketStore
//! let api = TicketFlowApi::new(db);
//! let decision = api.scan_ticket(&ticket_id).await?;
//! ```

pub mod auth_api;
pub mod ticket_flow_api;
pub mod ticket_objects;
