// libs/appointment-cell/tests/handlers_test.rs
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockHospitalResponses, TestConfig, TestUser};

struct TestApp {
    mock_server: MockServer,
    config: Arc<AppConfig>,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = TestConfig::with_api_url(&mock_server.uri()).to_arc();
        let router = appointment_routes(config.clone());

        Self {
            mock_server,
            config,
            router,
        }
    }

    fn token_for(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.config.jwt_secret, None)
    }

    async fn send(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token));

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn mount_appointment(&self, id: i64, status: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/appointments/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::appointment_response(
                id,
                7,
                4,
                "2024-06-03",
                "09:00:00",
                status,
            )))
            .mount(&self.mock_server)
            .await;
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/my").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_books_appointment() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/availability/doctor/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::availability_window(1, 7, "MONDAY", "09:00:00", "10:00:00", 30)
        ])))
        .mount(&app.mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/availability/doctor/7/slots"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockHospitalResponses::slots_response(7, "2024-06-03", &["09:00", "09:30"])),
        )
        .mount(&app.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appointments/book"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockHospitalResponses::appointment_response(
            40,
            7,
            4,
            "2024-06-03",
            "09:30:00",
            "REQUESTED",
        )))
        .expect(1)
        .mount(&app.mock_server)
        .await;

    let token = app.token_for(&TestUser::patient("patient@example.com"));
    let (status, body) = app
        .send(
            Method::POST,
            "/book",
            &token,
            Some(json!({
                "doctorId": 7,
                "appointmentDate": "2024-06-03",
                "appointmentTime": "09:30",
                "reason": "Follow-up"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["id"], 40);
    assert_eq!(body["appointment"]["status"], "PENDING");
}

#[tokio::test]
async fn test_doctor_accepts_pending_appointment() {
    let app = TestApp::new().await;
    app.mount_appointment(12, "REQUESTED").await;
    Mock::given(method("PUT"))
        .and(path("/appointments/12/accept"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::appointment_response(
            12,
            7,
            4,
            "2024-06-03",
            "09:00:00",
            "ACCEPTED",
        )))
        .expect(1)
        .mount(&app.mock_server)
        .await;

    let token = app.token_for(&TestUser::doctor("doc@example.com"));
    let (status, body) = app.send(Method::PUT, "/12/accept", &token, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "ACCEPTED");
}

#[tokio::test]
async fn test_cancel_on_cancelled_is_bad_request_without_remote_update() {
    let app = TestApp::new().await;
    app.mount_appointment(12, "CANCELLED").await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mock_server)
        .await;

    let token = app.token_for(&TestUser::receptionist("desk@example.com"));
    let (status, body) = app.send(Method::PUT, "/12/cancel", &token, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("CANCELLED"));
}

#[tokio::test]
async fn test_patient_cannot_accept() {
    let app = TestApp::new().await;
    app.mount_appointment(12, "REQUESTED").await;

    let token = app.token_for(&TestUser::patient("patient@example.com"));
    let (status, _) = app.send(Method::PUT, "/12/accept", &token, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_remote_rejection_returns_conflict_with_current_record() {
    let app = TestApp::new().await;
    app.mount_appointment(12, "REQUESTED").await;
    Mock::given(method("PUT"))
        .and(path("/appointments/12/reject"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(MockHospitalResponses::error_response(
                400,
                "You are not allowed to reject this appointment",
            )),
        )
        .mount(&app.mock_server)
        .await;

    let token = app.token_for(&TestUser::doctor("other-doc@example.com"));
    let (status, body) = app.send(Method::PUT, "/12/reject", &token, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You are not allowed to reject this appointment");
    assert_eq!(body["current"]["id"], 12);
    assert_eq!(body["current"]["status"], "PENDING");
}

#[tokio::test]
async fn test_admin_sets_status() {
    let app = TestApp::new().await;
    app.mount_appointment(12, "ACCEPTED").await;
    Mock::given(method("PUT"))
        .and(path("/appointments/12/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::appointment_response(
            12,
            7,
            4,
            "2024-06-03",
            "09:00:00",
            "COMPLETED",
        )))
        .expect(1)
        .mount(&app.mock_server)
        .await;

    let token = app.token_for(&TestUser::admin("admin@example.com"));
    let (status, body) = app
        .send(Method::PUT, "/12/status", &token, Some(json!({ "status": "COMPLETED" })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_search_is_staff_only() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::paged_response(vec![], 0, 0)))
        .mount(&app.mock_server)
        .await;

    let patient = app.token_for(&TestUser::patient("patient@example.com"));
    let (status, _) = app.send(Method::GET, "/?status=PENDING", &patient, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let receptionist = app.token_for(&TestUser::receptionist("desk@example.com"));
    let (status, body) = app.send(Method::GET, "/?status=PENDING&page=0", &receptionist, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 0);
}

#[tokio::test]
async fn test_unreachable_remote_is_service_unavailable() {
    let config = TestConfig::with_api_url("http://127.0.0.1:9").to_arc();
    let router = appointment_routes(config.clone());
    let token = JwtTestUtils::create_test_token(&TestUser::patient("patient@example.com"), &config.jwt_secret, None);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/my")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
