use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

static NEXT_USER_ID: AtomicU64 = AtomicU64::new(1000);

pub struct TestConfig {
    pub jwt_secret: String,
    pub hospital_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            hospital_api_url: "http://localhost:8080".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            hospital_api_url: api_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            hospital_api_url: self.hospital_api_url.clone(),
            jwt_secret: self.jwt_secret.clone(),
            request_timeout_secs: 5,
            bind_address: "127.0.0.1:0".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient("test@example.com")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: NEXT_USER_ID.fetch_add(1, Ordering::Relaxed).to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "DOCTOR")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "PATIENT")
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "RECEPTIONIST")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "ADMIN")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Role::from_claim(&self.role),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// JSON bodies shaped like the remote hospital service's responses.
pub struct MockHospitalResponses;

impl MockHospitalResponses {
    pub fn availability_window(
        id: i64,
        doctor_id: i64,
        day_of_week: &str,
        start_time: &str,
        end_time: &str,
        slot_duration: u32,
    ) -> Value {
        json!({
            "id": id,
            "doctorId": doctor_id,
            "dayOfWeek": day_of_week,
            "startTime": start_time,
            "endTime": end_time,
            "slotDuration": slot_duration
        })
    }

    pub fn slots_response(doctor_id: i64, date: &str, slots: &[&str]) -> Value {
        json!({
            "doctorId": doctor_id,
            "date": date,
            "slots": slots
        })
    }

    pub fn appointment_response(
        id: i64,
        doctor_id: i64,
        patient_id: i64,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "doctorId": doctor_id,
            "patientId": patient_id,
            "appointmentDate": date,
            "appointmentTime": time,
            "reason": null,
            "status": status
        })
    }

    pub fn paged_response(data: Vec<Value>, current_page: u32, total_pages: u32) -> Value {
        json!({
            "data": data.clone(),
            "currentPage": current_page,
            "totalItems": data.len(),
            "totalPages": total_pages
        })
    }

    pub fn error_response(status: u16, message: &str) -> Value {
        json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "status": status,
            "error": "Bad Request",
            "message": message,
            "path": "/appointments"
        })
    }
}
