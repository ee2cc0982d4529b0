use crate::common::config::ServerConfig;
use crate::common::{EnrollError, Result};
use crate::core::status::EnrollmentStatus;
use crate::service::protocol::{
    parse_error_detail, DetailResponse, FaceRegistrationRequest, FaceRegistrationResponse,
    FaceStatusResponse, LoginRequest, LoginResponse, UserProfile,
    FACE_DELETE_PATH, FACE_REGISTER_PATH, FACE_STATUS_PATH, LOGIN_PATH, ME_PATH,
};
use crate::service::EnrollmentApi;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Blocking REST client for the attendance backend.
pub struct ServiceClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ServiceClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(EnrollError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> Result<T> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let detail = parse_error_detail(&body).unwrap_or_else(|| fallback.to_string());
            tracing::warn!("Server returned {}: {}", status, detail);
            return Err(EnrollError::Server { status: status.as_u16(), detail });
        }

        serde_json::from_str(&body)
            .map_err(|e| EnrollError::Protocol(format!("unexpected response body: {}", e)))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        tracing::info!("Logging in as {}", email);
        let request = self.http.post(self.url(LOGIN_PATH)).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        self.send_json(request, "Login failed")
    }

    pub fn me(&self) -> Result<UserProfile> {
        let request = self.authorized(self.http.get(self.url(ME_PATH)))?;
        self.send_json(request, "Not authorized")
    }
}

impl EnrollmentApi for ServiceClient {
    fn face_status(&self) -> Result<EnrollmentStatus> {
        let request = self.authorized(self.http.get(self.url(FACE_STATUS_PATH)))?;
        let wire: FaceStatusResponse = self.send_json(request, "Failed to load face status")?;
        EnrollmentStatus::try_from(wire)
    }

    fn register_face(&self, image_data: &str) -> Result<String> {
        tracing::info!("Uploading face capture ({} bytes)", image_data.len());
        let request = self.authorized(self.http.post(self.url(FACE_REGISTER_PATH)))?
            .json(&FaceRegistrationRequest { image_data: image_data.to_string() });
        let response: FaceRegistrationResponse = self.send_json(request, "Failed to register face")?;
        Ok(response.message)
    }

    fn delete_face(&self) -> Result<String> {
        let request = self.authorized(self.http.delete(self.url(FACE_DELETE_PATH)))?;
        let response: DetailResponse = self.send_json(request, "Failed to delete face registration")?;
        Ok(response.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn config(base_url: &str) -> ServerConfig {
        ServerConfig { base_url: base_url.to_string(), timeout_seconds: 5 }
    }

    /// Serves one canned response on a loopback port and hands back the raw request.
    fn serve_once(status_line: &str, content_type: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content_type,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let request = read_request(&mut socket);
            socket.write_all(response.as_bytes()).unwrap();
            socket.flush().unwrap();
            request
        });
        (base_url, handle)
    }

    fn read_request(socket: &mut impl Read) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn client(base_url: &str) -> ServiceClient {
        let mut client = ServiceClient::new(&config(base_url)).unwrap().with_token("tok");
        // Loopback must not go through a proxy picked up from the environment.
        client.http = Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap();
        client
    }

    fn has_bearer_header(request: &str) -> bool {
        request.lines().any(|line| line.eq_ignore_ascii_case("authorization: Bearer tok"))
    }

    #[test]
    fn register_error_uses_server_detail() {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"detail":"No face detected"}"#,
        );

        let err = client(&base_url).register_face("data:image/jpeg;base64,AAAA").unwrap_err();
        let request = server.join().unwrap();

        match err {
            EnrollError::Server { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "No face detected");
            }
            other => panic!("expected server error, got {:?}", other),
        }
        assert!(request.starts_with("POST /api/biometric/face/register HTTP/1.1\r\n"));
        assert!(has_bearer_header(&request));
        assert!(request.ends_with(r#"{"image_data":"data:image/jpeg;base64,AAAA"}"#));
    }

    #[test]
    fn non_json_error_falls_back_per_operation() {
        let (base_url, server) = serve_once(
            "502 Bad Gateway",
            "text/html",
            "<html><body>Bad Gateway</body></html>",
        );

        let err = client(&base_url).delete_face().unwrap_err();
        let request = server.join().unwrap();

        match err {
            EnrollError::Server { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "Failed to delete face registration");
            }
            other => panic!("expected server error, got {:?}", other),
        }
        assert!(request.starts_with("DELETE /api/biometric/face HTTP/1.1\r\n"));
        assert!(has_bearer_header(&request));
    }

    #[test]
    fn rejected_token_is_unauthorized() {
        let (base_url, server) = serve_once(
            "401 Unauthorized",
            "application/json",
            r#"{"detail":"Could not validate credentials"}"#,
        );

        let err = client(&base_url).me().unwrap_err();
        let request = server.join().unwrap();

        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Could not validate credentials");
        assert!(request.starts_with("GET /api/auth/me HTTP/1.1\r\n"));
    }

    #[test]
    fn status_success_is_decoded() {
        let (base_url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"has_face_registered":true,"enrolled_at":"2024-03-01T08:30:00","last_verified_at":null}"#,
        );

        let status = client(&base_url).face_status().unwrap();
        let request = server.join().unwrap();

        assert!(status.has_face_registered());
        assert!(status.enrolled_at().is_some());
        assert!(request.starts_with("GET /api/biometric/face/status HTTP/1.1\r\n"));
        assert!(has_bearer_header(&request));
    }

    #[test]
    fn success_with_unexpected_body_is_a_protocol_error() {
        let (base_url, server) = serve_once("200 OK", "text/plain", "ok");

        let err = client(&base_url).delete_face().unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, EnrollError::Protocol(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ServiceClient::new(&config("http://localhost:8000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(FACE_STATUS_PATH), "http://localhost:8000/api/biometric/face/status");
    }

    #[test]
    fn biometric_calls_require_a_token() {
        let client = ServiceClient::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(client.face_status(), Err(EnrollError::NotLoggedIn)));
        assert!(matches!(client.register_face("data:image/jpeg;base64,"), Err(EnrollError::NotLoggedIn)));
        assert!(matches!(client.delete_face(), Err(EnrollError::NotLoggedIn)));
        assert!(matches!(client.me(), Err(EnrollError::NotLoggedIn)));
    }
}
