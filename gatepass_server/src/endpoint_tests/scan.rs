use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gatepass_engine::{
    db_types::{Ticket, TicketStatus},
    TicketFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{admin_token, gate_token, get_auth_config, no_role_token, post_request, sample_ticket},
    mocks::MockTicketDb,
};
use crate::{
    middleware::JwtMiddlewareFactory,
    routes::{ConfirmEntryRoute, ScanTicketRoute},
};

fn scan_body(ticket_id: &str) -> Value {
    json!({"ticket_id": ticket_id, "gate_id": "G1", "device_id": "KIOSK-4"})
}

#[actix_web::test]
async fn gate_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    let err = post_request("", "/scan/scan", &scan_body("VERIF001"), configure).await.expect_err("Expected error");
    assert_eq!(err, "Access token invalid or not provided");
}

#[actix_web::test]
async fn tokens_without_a_gate_role_are_refused() {
    let _ = env_logger::try_init().ok();
    let err = post_request(&no_role_token(), "/scan/scan", &scan_body("VERIF001"), configure)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn scanning_a_verified_ticket_shows_the_holder() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&gate_token(), "/scan/scan", &scan_body("VERIF001"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["result"], "VERIFIED");
    assert_eq!(resp["message"], "Valid Ticket");
    assert_eq!(resp["ticket"]["name"], "Priya Sharma");
    assert_eq!(resp["ticket"]["ticket_type"], "GOLD");
}

#[actix_web::test]
async fn admins_can_run_the_gate_too() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(&admin_token(), "/scan/scan", &scan_body("VERIF001"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn every_inadmissible_scan_has_its_message() {
    let _ = env_logger::try_init().ok();
    let cases = [
        ("PENDI001", "PENDING", "Payment Not Verified"),
        ("REJEC001", "REJECTED", "Ticket Rejected"),
        ("USEDX001", "USED", "Already Used"),
        ("ZZ99ZZ99", "INVALID", "Invalid Ticket"),
        ("spork", "INVALID", "Invalid Ticket"),
    ];
    for (id, result, message) in cases {
        let (status, body) =
            post_request(&gate_token(), "/scan/scan", &scan_body(id), configure).await.expect("Request failed");
        assert_eq!(status, StatusCode::OK, "scan of {id} must always be a 200");
        let resp: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(resp["result"], result);
        assert_eq!(resp["message"], message);
        assert!(resp.as_object().unwrap().get("ticket").is_none(), "{id} must not leak a projection");
    }
}

#[actix_web::test]
async fn confirming_a_verified_ticket_redeems_it() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&gate_token(), "/scan/confirm", &scan_body("VERIF001"), configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["success"], true);
    assert_eq!(resp["message"], "Entry Confirmed");
    assert_eq!(resp["ticket"]["ticket_id"], "VERIF001");
    assert_eq!(resp["ticket"]["name"], "Priya Sharma");
}

#[actix_web::test]
async fn only_verified_tickets_get_through_the_gate() {
    let _ = env_logger::try_init().ok();
    // A pending ticket, a missing ticket and a malformed id all come back as the same 400.
    for id in ["PENDI001", "ZZ99ZZ99", "spork"] {
        let (status, body) =
            post_request(&gate_token(), "/scan/confirm", &scan_body(id), configure).await.expect("Request failed");
        assert_eq!(status, StatusCode::BAD_REQUEST, "confirm of {id} must be refused");
        assert!(body.contains("Ticket not valid for entry"), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn gate_metadata_is_recorded_with_the_entry() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(&gate_token(), "/scan/confirm", &scan_body("VERIF001"), configure_metadata)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

fn redeemed(id: &str) -> Ticket {
    let mut ticket = sample_ticket(id, TicketStatus::Used);
    ticket.used_at = Some(ticket.created_at);
    ticket
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockTicketDb::new();
    db.expect_fetch_ticket_by_ticket_id().returning(|id| {
        Ok(match id.as_str() {
            "VERIF001" => Some(sample_ticket("VERIF001", TicketStatus::Verified)),
            "PENDI001" => Some(sample_ticket("PENDI001", TicketStatus::Pending)),
            "REJEC001" => Some(sample_ticket("REJEC001", TicketStatus::Rejected)),
            "USEDX001" => Some(redeemed("USEDX001")),
            _ => None,
        })
    });
    // Only the verified ticket redeems; everything else matches no row.
    db.expect_redeem_ticket().returning(|id, _| {
        Ok(match id.as_str() {
            "VERIF001" => Some(redeemed("VERIF001")),
            _ => None,
        })
    });
    register(cfg, db);
}

fn configure_metadata(cfg: &mut ServiceConfig) {
    let mut db = MockTicketDb::new();
    db.expect_redeem_ticket()
        .withf(|id, entry| {
            id.as_str() == "VERIF001" &&
                entry.gate_id.as_deref() == Some("G1") &&
                entry.device_id.as_deref() == Some("KIOSK-4")
        })
        .returning(|id, _| Ok(Some(redeemed(id.as_str()))));
    register(cfg, db);
}

fn register(cfg: &mut ServiceConfig, db: MockTicketDb) {
    let api = TicketFlowApi::new(db);
    let scope = web::scope("/scan")
        .wrap(JwtMiddlewareFactory::new(&get_auth_config()))
        .service(ScanTicketRoute::<MockTicketDb>::new())
        .service(ConfirmEntryRoute::<MockTicketDb>::new());
    cfg.service(scope).app_data(web::Data::new(api));
}
