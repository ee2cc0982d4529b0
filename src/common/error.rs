use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollError {
    /// Camera access refused, missing or failing.
    #[error("Camera error: {0}")]
    Camera(String),

    /// Non-2xx response carrying the server's human-readable detail.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    /// Response body that does not match the expected contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not logged in, run `face-enroll login` first")]
    NotLoggedIn,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl EnrollError {
    /// Message suitable for a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            EnrollError::Server { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EnrollError::Server { status: 401, .. })
    }
}

pub type Result<T> = std::result::Result<T, EnrollError>;
