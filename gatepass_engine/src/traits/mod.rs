//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the ticketing engine database *backends*.
//!
//! ## Tickets
//! A ticket is the central record of the system. It carries the holder's details, the payment proof reference, and a
//! status that moves along a small, one-way state machine (see [`TicketStore`]).
//!
//! ## Traits
//! * [`TicketStore`] defines the storage behaviour for tickets and the gate entry log.
//! * [`AuthManagement`] defines behaviour for managing login records and role assignments.
mod auth_management;
mod ticket_store;

pub use auth_management::{AuthApiError, AuthManagement};
pub use ticket_store::{TicketStore, TicketStoreError};
