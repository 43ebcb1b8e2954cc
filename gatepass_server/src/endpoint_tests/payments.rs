use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gatepass_engine::{db_types::TicketStatus, TicketFlowApi};
use gp_common::Secret;
use razorpay_tools::{PaymentSignature, RazorpayConfig};
use serde_json::{json, Value};

use super::{helpers::post_request, mocks::MockTicketDb};
use crate::routes::VerifyPaymentRoute;

// The gateway secret the test app is configured with. DO NOT re-use this secret anywhere.
const TEST_KEY_SECRET: &str = "rzp_test_secret_do_not_reuse";

fn payment_body(signature: &str) -> Value {
    json!({
        "razorpay_order_id": "order_NVxN3EnQ3LZz8K",
        "razorpay_payment_id": "pay_NVxQ3EnQ3LZz9X",
        "razorpay_signature": signature,
        "name": "Arjun Rao",
        "phone": "9876543210",
        "email": "arjun@example.com",
        "ticket_type": "SILVER",
        "price": 2000
    })
}

#[actix_web::test]
async fn a_signed_payment_issues_an_admissible_ticket() {
    let _ = env_logger::try_init().ok();
    let sig = PaymentSignature::create("order_NVxN3EnQ3LZz8K", "pay_NVxQ3EnQ3LZz9X", TEST_KEY_SECRET);
    let (status, body) = post_request("", "/payments/verify-payment", &payment_body(&sig.signature), configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let ticket: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ticket["status"], "VERIFIED");
    assert_eq!(ticket["name"], "Arjun Rao");
    assert_eq!(ticket["price"], 2000);
}

#[actix_web::test]
async fn a_tampered_signature_stores_nothing() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/payments/verify-payment", &payment_body(&"00".repeat(32)), configure_no_store)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Payment signature verification failed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_signature_for_a_different_order_stores_nothing() {
    let _ = env_logger::try_init().ok();
    let sig = PaymentSignature::create("order_SOMEBODY_ELSE", "pay_NVxQ3EnQ3LZz9X", TEST_KEY_SECRET);
    let (status, _) =
        post_request("", "/payments/verify-payment", &payment_body(&sig.signature), configure_no_store)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockTicketDb::new();
    // A gateway payment skips the review queue and lands directly in `Verified`.
    db.expect_insert_ticket()
        .withf(|_, _, status| *status == TicketStatus::Verified)
        .returning(|ticket, ticket_id, status| Ok(super::helpers::stored_row(ticket, ticket_id, status)));
    register(cfg, db);
}

// No store expectations at all; a store call here fails the test.
fn configure_no_store(cfg: &mut ServiceConfig) {
    register(cfg, MockTicketDb::new());
}

fn register(cfg: &mut ServiceConfig, db: MockTicketDb) {
    let api = TicketFlowApi::new(db);
    let gateway = RazorpayConfig {
        key_id: "rzp_test_k3y1d".to_string(),
        key_secret: Secret::new(TEST_KEY_SECRET.to_string()),
        api_url: "https://api.razorpay.com".to_string(),
    };
    cfg.service(VerifyPaymentRoute::<MockTicketDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}
