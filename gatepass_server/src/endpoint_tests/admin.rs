use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Days, Utc};
use gatepass_engine::{
    db_types::{Role, TicketStatus},
    AuthApi,
    TicketFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{admin_token, gate_token, get_auth_config, get_request, issue_token, post_request, sample_ticket},
    mocks::{MockAuthDb, MockTicketDb},
};
use crate::{
    auth::JwtClaims,
    middleware::JwtMiddlewareFactory,
    routes::{AdminTicketsRoute, AdminVerifyRoute, UpdateRolesRoute},
};

#[actix_web::test]
async fn the_review_queue_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/admin/tickets", configure).await.expect_err("Expected error");
    assert_eq!(err, "Access token invalid or not provided");
}

#[actix_web::test]
async fn the_review_queue_needs_the_admin_role() {
    let _ = env_logger::try_init().ok();
    let err = get_request(&gate_token(), "/admin/tickets", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn garbage_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let err = get_request("not.a.jwt", "/admin/tickets", configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error."), "unexpected error: {err}");
}

#[actix_web::test]
async fn expired_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let now = Utc::now();
    let claims = JwtClaims {
        sub: "admin@example.com".parse().unwrap(),
        roles: vec![Role::Admin],
        iat: (now - Days::new(2)).timestamp(),
        exp: (now - Days::new(1)).timestamp(),
    };
    let token = issue_token(&claims);
    let err = get_request(&token, "/admin/tickets", configure).await.expect_err("Expected error");
    assert!(err.contains("Access token signature is invalid"), "unexpected error: {err}");
}

#[actix_web::test]
async fn admins_see_full_ticket_rows() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&admin_token(), "/admin/tickets?status=PENDING", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let rows: Value = serde_json::from_str(&body).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // The review queue shows everything, contact details and the proof link included.
    assert_eq!(rows[0]["phone"], "+919876543210");
    assert_eq!(rows[0]["screenshot_url"], "https://cdn.example.com/proofs/1.png");
    assert_eq!(rows[1]["status"], "PENDING");
}

#[actix_web::test]
async fn verifying_a_pending_ticket() {
    let _ = env_logger::try_init().ok();
    let body = json!({"ticket_id": "PENDI001", "action": "VERIFY"});
    let (status, resp) = post_request(&admin_token(), "/admin/verify", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ticket: Value = serde_json::from_str(&resp).unwrap();
    assert_eq!(ticket["ticket_id"], "PENDI001");
    assert_eq!(ticket["status"], "VERIFIED");
}

#[actix_web::test]
async fn rejecting_a_pending_ticket() {
    let _ = env_logger::try_init().ok();
    let body = json!({"ticket_id": "PENDI001", "action": "REJECT"});
    let (status, resp) = post_request(&admin_token(), "/admin/verify", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ticket: Value = serde_json::from_str(&resp).unwrap();
    assert_eq!(ticket["status"], "REJECTED");
}

#[actix_web::test]
async fn rulings_on_settled_tickets_change_nothing() {
    let _ = env_logger::try_init().ok();
    let body = json!({"ticket_id": "USEDX001", "action": "VERIFY"});
    let (status, resp) = post_request(&admin_token(), "/admin/verify", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp.contains("cannot move from USED to VERIFIED"), "unexpected body: {resp}");
}

#[actix_web::test]
async fn rulings_on_missing_tickets_are_a_404() {
    let _ = env_logger::try_init().ok();
    let body = json!({"ticket_id": "ZZ99ZZ99", "action": "REJECT"});
    let (status, resp) = post_request(&admin_token(), "/admin/verify", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp.contains("Ticket ZZ99ZZ99 does not exist"), "unexpected body: {resp}");
}

#[actix_web::test]
async fn role_updates_apply_and_revoke() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"email": "staff@example.com", "apply": ["GateStaff"], "revoke": ["Admin"]}]);
    let (status, _) = post_request(&admin_token(), "/admin/roles", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn gate_staff_cannot_manage_roles() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"email": "staff@example.com", "apply": ["Admin"], "revoke": []}]);
    let err = post_request(&gate_token(), "/admin/roles", &body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockTicketDb::new();
    db.expect_fetch_tickets_by_status()
        .withf(|status| *status == Some(TicketStatus::Pending))
        .returning(|_| {
            Ok(vec![
                sample_ticket("PENDI001", TicketStatus::Pending),
                sample_ticket("PENDI002", TicketStatus::Pending),
            ])
        });
    // Every ruling goes through the conditional update, and always from `Pending`.
    db.expect_update_status_if()
        .withf(|_, expected, _| *expected == TicketStatus::Pending)
        .returning(|id, _, new_status| {
            Ok(match id.as_str() {
                "PENDI001" => Some(sample_ticket("PENDI001", new_status)),
                _ => None,
            })
        });
    db.expect_fetch_ticket_by_ticket_id().returning(|id| {
        Ok(match id.as_str() {
            "USEDX001" => Some(sample_ticket("USEDX001", TicketStatus::Used)),
            _ => None,
        })
    });
    let tickets_api = TicketFlowApi::new(db);

    let mut auth_db = MockAuthDb::new();
    auth_db
        .expect_assign_roles()
        .withf(|email, roles| email.as_str() == "staff@example.com" && roles == [Role::GateStaff])
        .returning(|_, _| Ok(()));
    auth_db
        .expect_remove_roles()
        .withf(|email, roles| email.as_str() == "staff@example.com" && roles == [Role::Admin])
        .returning(|_, _| Ok(1));
    let auth_api = AuthApi::new(auth_db);

    let scope = web::scope("/admin")
        .wrap(JwtMiddlewareFactory::new(&get_auth_config()))
        .service(AdminTicketsRoute::<MockTicketDb>::new())
        .service(AdminVerifyRoute::<MockTicketDb>::new())
        .service(UpdateRolesRoute::<MockAuthDb>::new());
    cfg.service(scope).app_data(web::Data::new(tickets_api)).app_data(web::Data::new(auth_api));
}
