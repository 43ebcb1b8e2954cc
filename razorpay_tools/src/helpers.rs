use chrono::Utc;

/// Builds a receipt id for a new gateway order. Razorpay requires receipts to be unique per
/// account, so the millisecond timestamp is good enough for a single booking server.
pub fn new_receipt_id() -> String {
    format!("receipt_{}", Utc::now().timestamp_millis())
}
