use gp_common::Rupees;
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a gateway order. Razorpay echoes these back verbatim on every
/// order fetch, which is how the booking details survive the round trip through the checkout page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
}

/// The request body for `POST /v1/orders`. Amounts are in paise.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderBody {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

impl NewOrderBody {
    pub fn new(amount: Rupees, currency: &str, receipt: String, notes: OrderNotes) -> Self {
        Self { amount: amount.to_paise(), currency: currency.to_string(), receipt, notes }
    }
}

/// A gateway order as Razorpay returns it. `amount` fields are in paise and `created_at` is a unix
/// timestamp, both as the API defines them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub notes: OrderNotes,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RazorpayPayment {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    pub created_at: i64,
}
