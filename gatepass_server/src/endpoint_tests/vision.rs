use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gp_common::Rupees;
use serde_json::{json, Value};

use super::{helpers::post_request, mocks::MockVision};
use crate::{
    integrations::{StudentIdCheck, UtrExtraction, VisionApiError},
    routes::{ExtractUtrRoute, VerifyStudentIdRoute},
};

fn image_body() -> Value {
    json!({"image_b64": "aGVsbG8=", "mime_type": "image/png"})
}

#[actix_web::test]
async fn utr_extraction_returns_whatever_was_legible() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/tickets/extract-utr", &image_body(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["utr_number"], "123456789012");
    assert_eq!(resp["extracted_amount"], 3500);
    assert_eq!(resp["extracted_date"], Value::Null);
}

#[actix_web::test]
async fn student_id_checks_return_the_eligibility_verdict() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/students/verify-id", &image_body(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["eligible"], true);
    assert_eq!(resp["college"], "IIT Bombay");
}

#[actix_web::test]
async fn vision_failures_are_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/tickets/extract-utr", &image_body(), configure_broken).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Vision service error"), "unexpected body: {body}");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut vision = MockVision::new();
    vision.expect_extract_utr().returning(|_, _| {
        Ok(UtrExtraction {
            utr_number: Some("123456789012".to_string()),
            extracted_amount: Some(Rupees::from(3500)),
            extracted_date: None,
        })
    });
    vision.expect_verify_student_id().returning(|_, _| {
        Ok(StudentIdCheck {
            name: Some("Priya Sharma".to_string()),
            college: Some("IIT Bombay".to_string()),
            valid_till_year: Some(2027),
            eligible: true,
        })
    });
    register(cfg, vision);
}

fn configure_broken(cfg: &mut ServiceConfig) {
    let mut vision = MockVision::new();
    vision
        .expect_extract_utr()
        .returning(|_, _| Err(VisionApiError::UnusableReply("the model answered in prose".to_string())));
    register(cfg, vision);
}

fn register(cfg: &mut ServiceConfig, vision: MockVision) {
    cfg.service(ExtractUtrRoute::<MockVision>::new())
        .service(VerifyStudentIdRoute::<MockVision>::new())
        .app_data(web::Data::new(vision));
}
