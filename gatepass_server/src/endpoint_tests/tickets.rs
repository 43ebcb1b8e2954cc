use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gatepass_engine::{db_types::TicketStatus, TicketFlowApi};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request, sample_ticket, stored_row},
    mocks::MockTicketDb,
};
use crate::routes::{CreateTicketRoute, TicketByIdRoute};

fn purchase_body() -> Value {
    json!({
        "name": "Priya Sharma",
        "phone": "+91 98765 43210",
        "email": "priya@example.com",
        "ticket_type": "GOLD",
        "price": 3500,
        "screenshot_url": "https://cdn.example.com/proofs/1.png",
        "utr_number": "123456789012"
    })
}

#[actix_web::test]
async fn buying_a_ticket_returns_the_public_view() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/tickets", &purchase_body(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let ticket: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ticket["status"], "PENDING");
    assert_eq!(ticket["name"], "Priya Sharma");
    assert_eq!(ticket["price"], 3500);
    assert_eq!(ticket["ticket_id"].as_str().unwrap().len(), 8);
    let fields = ticket.as_object().unwrap();
    assert!(!fields.contains_key("phone"));
    assert!(!fields.contains_key("email"));
    assert!(!fields.contains_key("screenshot_url"));
}

#[actix_web::test]
async fn bad_purchases_never_reach_the_store() {
    let _ = env_logger::try_init().ok();
    let mut bad_email = purchase_body();
    bad_email["email"] = json!("not-an-email");
    let (status, body) =
        post_request("", "/tickets", &bad_email, configure_no_store).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid email address"), "unexpected body: {body}");

    let mut free_ticket = purchase_body();
    free_ticket["price"] = json!(0);
    let (status, body) =
        post_request("", "/tickets", &free_ticket, configure_no_store).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("price must be a positive number of rupees"), "unexpected body: {body}");
}

#[actix_web::test]
async fn ticket_lookups_return_the_public_projection() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/tickets/VERIF001", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ticket: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ticket["ticket_id"], "VERIF001");
    assert_eq!(ticket["status"], "VERIFIED");
    let fields = ticket.as_object().unwrap();
    assert!(!fields.contains_key("phone"));
    assert!(!fields.contains_key("utr_number"));
}

#[actix_web::test]
async fn missing_and_malformed_ids_are_the_same_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/tickets/ZZ99ZZ99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Ticket ZZ99ZZ99 does not exist"), "unexpected body: {body}");

    let (status, body) = get_request("", "/tickets/spork", configure_no_store).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Ticket spork does not exist"), "unexpected body: {body}");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockTicketDb::new();
    db.expect_insert_ticket()
        .withf(|_, _, status| *status == TicketStatus::Pending)
        .returning(|ticket, ticket_id, status| Ok(stored_row(ticket, ticket_id, status)));
    db.expect_fetch_ticket_by_ticket_id().returning(|id| {
        Ok(match id.as_str() {
            "VERIF001" => Some(sample_ticket("VERIF001", TicketStatus::Verified)),
            _ => None,
        })
    });
    register(cfg, db);
}

// No store expectations at all; any store call here fails the test.
fn configure_no_store(cfg: &mut ServiceConfig) {
    register(cfg, MockTicketDb::new());
}

fn register(cfg: &mut ServiceConfig, db: MockTicketDb) {
    let api = TicketFlowApi::new(db);
    cfg.service(CreateTicketRoute::<MockTicketDb>::new())
        .service(TicketByIdRoute::<MockTicketDb>::new())
        .app_data(web::Data::new(api));
}
