use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::RemoteError;

const DEFAULT_REJECTION_MESSAGE: &str = "Request was rejected";

/// Thin JSON client for the remote hospital service. Every call forwards the
/// caller's bearer token; the remote service is the authority for persistence.
#[derive(Clone)]
pub struct HospitalApiClient {
    client: Client,
    base_url: String,
}

impl HospitalApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.hospital_api_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| RemoteError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
    {
        self.request_with_query(method, path, &[], auth_token, body).await
    }

    pub async fn request_with_query<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url).headers(headers);

        if !query.is_empty() {
            req = req.query(query);
        }

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);
            return Err(RemoteError::from_status(status, extract_message(&error_text)));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Pull the user-visible text out of a remote error body (`{"message": ...}`),
/// falling back to the raw body.
fn extract_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match from_json {
        Some(message) if !message.trim().is_empty() => message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => DEFAULT_REJECTION_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HospitalApiClient {
        HospitalApiClient::new(&AppConfig {
            hospital_api_url: server.uri(),
            jwt_secret: "secret".to_string(),
            request_timeout_secs: 5,
            bind_address: "127.0.0.1:0".to_string(),
        })
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"status":400,"message":"Time slot is already booked"}"#),
            "Time slot is already booked"
        );
        assert_eq!(extract_message(r#"{"error":"Bad Request"}"#), "Bad Request");
        assert_eq!(extract_message("plain failure"), "plain failure");
        assert_eq!(extract_message(""), DEFAULT_REJECTION_MESSAGE);
    }

    #[tokio::test]
    async fn test_request_forwards_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/availability/doctor/7/slots"))
            .and(query_param("date", "2024-06-03"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slots": ["09:00:00"]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let body: Value = client
            .request_with_query(
                Method::GET,
                "/availability/doctor/7/slots",
                &[("date", "2024-06-03".to_string())],
                Some("abc"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(body["slots"][0], "09:00:00");
    }

    #[tokio::test]
    async fn test_rejection_carries_remote_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/appointments/1/accept"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": 400,
                "error": "Bad Request",
                "message": "Only requested appointments can be accepted"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Result<Value, _> = client
            .request(Method::PUT, "/appointments/1/accept", Some("abc"), None)
            .await;

        assert_matches!(
            result,
            Err(RemoteError::Rejected { status: 400, ref message }) if message == "Only requested appointments can be accepted"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/appointments/my"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Result<Vec<Value>, _> = client
            .request(Method::GET, "/appointments/my", Some("abc"), None)
            .await;

        assert_matches!(result, Err(RemoteError::Decode(_)));
    }
}
