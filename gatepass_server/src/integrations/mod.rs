//! Clients for the external services GatePass leans on: the OTP mailer that authenticates staff,
//! and the vision model that reads payment screenshots and student ID cards.
//!
//! Each client sits behind a small trait so that routes stay testable without the network.

mod identity;
mod vision;

pub use identity::{HttpIdentityProvider, IdentityApiError, IdentityProvider};
pub use vision::{HttpVisionExtractor, StudentIdCheck, UtrExtraction, VisionApiError, VisionExtractor};
