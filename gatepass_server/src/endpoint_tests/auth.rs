use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gatepass_engine::{db_types::Role, AuthApi};
use jsonwebtoken::DecodingKey;
use serde_json::{json, Value};

use super::{
    helpers::{get_auth_config, post_request},
    mocks::{MockAuthDb, MockIdentity},
};
use crate::{
    auth::{validate_access_token, TokenIssuer},
    integrations::IdentityApiError,
    routes::{RequestOtpRoute, VerifyOtpRoute},
};

#[actix_web::test]
async fn otp_requests_go_to_the_identity_service() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "staff@example.com"});
    let (status, resp) = post_request("", "/auth/request-otp", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let resp: Value = serde_json::from_str(&resp).unwrap();
    assert_eq!(resp["success"], true);
    assert_eq!(resp["message"], "OTP sent");
}

#[actix_web::test]
async fn a_correct_code_logs_in_with_the_stored_roles() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "staff@example.com", "otp": "123456"});
    let (status, resp) = post_request("", "/auth/verify-otp", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let login: Value = serde_json::from_str(&resp).unwrap();
    assert_eq!(login["roles"], json!(["Admin"]));
    // The issued token must validate against the same signing config and carry the roles.
    let token = login["access_token"].as_str().unwrap();
    let key = DecodingKey::from_secret(get_auth_config().jwt_secret.reveal().as_bytes());
    let claims = validate_access_token(token, &key).expect("the issued token must validate");
    assert_eq!(claims.sub.as_str(), "staff@example.com");
    assert_eq!(claims.roles, vec![Role::Admin]);
}

#[actix_web::test]
async fn a_wrong_code_does_not_log_in() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "staff@example.com", "otp": "000000"});
    let (status, resp) =
        post_request("", "/auth/verify-otp", &body, configure_wrong_code).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(resp.contains("The code is wrong or has expired"), "unexpected body: {resp}");
}

#[actix_web::test]
async fn logins_with_no_roles_still_succeed() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "staff@example.com", "otp": "123456"});
    let (status, resp) = post_request("", "/auth/verify-otp", &body, configure_no_roles).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let login: Value = serde_json::from_str(&resp).unwrap();
    assert_eq!(login["roles"], json!([]));
    assert!(!login["access_token"].as_str().unwrap().is_empty());
}

fn configure(cfg: &mut ServiceConfig) {
    let mut identity = MockIdentity::new();
    identity.expect_send_otp().withf(|email| email.as_str() == "staff@example.com").returning(|_| Ok(()));
    identity
        .expect_verify_otp()
        .withf(|email, otp| email.as_str() == "staff@example.com" && otp == "123456")
        .returning(|_, _| Ok(()));
    let mut auth_db = MockAuthDb::new();
    auth_db.expect_upsert_auth_account().returning(|_| Ok(()));
    auth_db.expect_fetch_roles_for_email().returning(|_| Ok(vec![Role::Admin]));
    register(cfg, identity, auth_db);
}

// The identity service refuses the code; the login must never be recorded.
fn configure_wrong_code(cfg: &mut ServiceConfig) {
    let mut identity = MockIdentity::new();
    identity
        .expect_verify_otp()
        .returning(|_, _| Err(IdentityApiError::OtpRejected("The code is wrong or has expired".to_string())));
    register(cfg, identity, MockAuthDb::new());
}

fn configure_no_roles(cfg: &mut ServiceConfig) {
    let mut identity = MockIdentity::new();
    identity.expect_verify_otp().returning(|_, _| Ok(()));
    let mut auth_db = MockAuthDb::new();
    auth_db.expect_upsert_auth_account().returning(|_| Ok(()));
    auth_db.expect_fetch_roles_for_email().returning(|_| Ok(vec![]));
    register(cfg, identity, auth_db);
}

fn register(cfg: &mut ServiceConfig, identity: MockIdentity, auth_db: MockAuthDb) {
    let auth_api = AuthApi::new(auth_db);
    let signer = TokenIssuer::new(&get_auth_config());
    cfg.service(RequestOtpRoute::<MockIdentity>::new())
        .service(VerifyOtpRoute::<MockIdentity, MockAuthDb>::new())
        .app_data(web::Data::new(identity))
        .app_data(web::Data::new(auth_api))
        .app_data(web::Data::new(signer));
}
