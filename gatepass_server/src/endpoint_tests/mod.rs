//! Endpoint tests for the REST routes.
//!
//! These tests drive the actix service in-process against mocked backends, so they cover request
//! parsing, the auth middleware and the response shapes without touching a database. The ticket
//! state machine itself is tested in the engine crate.
mod admin;
mod auth;
mod helpers;
mod mocks;
mod payments;
mod scan;
mod tickets;
mod vision;
