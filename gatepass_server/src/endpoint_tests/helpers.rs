use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{Days, TimeZone, Utc};
use gatepass_engine::db_types::{NewTicket, Role, Roles, Ticket, TicketId, TicketStatus};
use gp_common::{Rupees, Secret};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use serde::Serialize;

use crate::{auth::JwtClaims, config::AuthConfig};

// Creates a test `AuthConfig` for signing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e".to_string()),
        token_validity: chrono::Duration::hours(24),
    }
}

pub fn issue_token(claims: &JwtClaims) -> String {
    let config = get_auth_config();
    let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    encode(&Header::default(), claims, &key).expect("Failed to sign token")
}

pub fn token_for(email: &str, roles: Roles) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: email.parse().expect("test emails are well formed"),
        roles,
        iat: now.timestamp(),
        exp: (now + Days::new(1)).timestamp(),
    };
    issue_token(&claims)
}

pub fn admin_token() -> String {
    token_for("admin@example.com", vec![Role::Admin])
}

pub fn gate_token() -> String {
    token_for("gate@example.com", vec![Role::GateStaff])
}

pub fn no_role_token() -> String {
    token_for("guest@example.com", vec![])
}

/// A ticket row as the store would return it.
pub fn sample_ticket(id: &str, status: TicketStatus) -> Ticket {
    Ticket {
        id: 1,
        ticket_id: id.parse().expect("test ticket ids are well formed"),
        name: "Priya Sharma".to_string(),
        phone: "+919876543210".to_string(),
        email: "priya@example.com".to_string(),
        ticket_type: "GOLD".to_string(),
        price: Rupees::from(3500),
        screenshot_url: "https://cdn.example.com/proofs/1.png".to_string(),
        utr_number: Some("123456789012".to_string()),
        status,
        created_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap(),
        used_at: None,
    }
}

/// The row the store would hand back after inserting `ticket`.
pub fn stored_row(ticket: NewTicket, ticket_id: &TicketId, status: TicketStatus) -> Ticket {
    Ticket {
        id: 1,
        ticket_id: ticket_id.clone(),
        name: ticket.name,
        phone: ticket.phone,
        email: ticket.email,
        ticket_type: ticket.ticket_type,
        price: ticket.price,
        screenshot_url: ticket.screenshot_url,
        utr_number: ticket.utr_number,
        status,
        created_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap(),
        used_at: None,
    }
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    execute(req, configure).await
}

pub async fn post_request<T: Serialize>(
    token: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    execute(req, configure).await
}

async fn execute(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) =
        test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
