mod api;
mod config;
mod error;
mod signature;

mod data_objects;
mod helpers;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{NewOrderBody, OrderNotes, RazorpayOrder, RazorpayPayment};
pub use error::RazorpayApiError;
pub use helpers::new_receipt_id;
pub use signature::{PaymentSignature, PaymentSignatureError};
