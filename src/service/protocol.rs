use serde::{Deserialize, Serialize};

pub const FACE_STATUS_PATH: &str = "/api/biometric/face/status";
pub const FACE_REGISTER_PATH: &str = "/api/biometric/face/register";
pub const FACE_DELETE_PATH: &str = "/api/biometric/face";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const ME_PATH: &str = "/api/auth/me";

// Biometric

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FaceStatusResponse {
    pub has_face_registered: bool,
    #[serde(default)]
    pub enrolled_at: Option<String>,
    #[serde(default)]
    pub last_verified_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FaceRegistrationRequest {
    /// `data:image/jpeg;base64,...`
    pub image_data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FaceRegistrationResponse {
    pub message: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub face_detected: Option<bool>,
    #[serde(default)]
    pub quality_score: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DetailResponse {
    pub detail: String,
}

/// Error body. FastAPI sends either a plain string or a list of validation
/// entries under `detail`.
#[derive(Deserialize, Debug, Clone)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationEntry>),
}

#[derive(Deserialize, Debug, Clone)]
pub struct ValidationEntry {
    pub msg: String,
}

impl ErrorDetail {
    pub fn to_message(&self) -> Option<String> {
        match self {
            ErrorDetail::Message(msg) if !msg.trim().is_empty() => Some(msg.clone()),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Validation(entries) if !entries.is_empty() => Some(
                entries.iter().map(|e| e.msg.as_str()).collect::<Vec<_>>().join("; "),
            ),
            ErrorDetail::Validation(_) => None,
        }
    }
}

/// Server-supplied message from an error body, if one can be read.
pub fn parse_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.to_message())
}

// Session

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub tokens: AuthTokens,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    #[serde(default)]
    pub role: Option<NamedRef>,
    #[serde(default)]
    pub department: Option<NamedRef>,
    #[serde(default)]
    pub shift: Option<NamedRef>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
