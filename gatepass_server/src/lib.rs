//! # GatePass server
//! This crate hosts the REST server for GatePass. It is responsible for:
//! * Accepting ticket bookings against manual payment proofs or Razorpay gateway payments.
//! * Letting admins review pending payment proofs and verify or reject them.
//! * Driving the gate consoles on event day (scanning and entry confirmation).
//! * Issuing access tokens to admins and gate staff via email OTP login.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/tickets`: Booking a ticket and fetching a ticket's public projection.
//! * `/tickets/extract-utr`, `/students/verify-id`: Advisory image-reading helpers for the booking form.
//! * `/payments/create-order`, `/payments/verify-payment`: The Razorpay gateway flow.
//! * `/auth/request-otp`, `/auth/verify-otp`: OTP login for staff accounts.
//! * `/admin/*`: The verification queue and role management. Admin role required.
//! * `/scan/*`: The gate console endpoints. GateStaff or Admin role required.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
