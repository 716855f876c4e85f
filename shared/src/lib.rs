use serde::{Deserialize, Serialize};

pub mod capture;
pub mod diagnosis;
pub mod handoff;
pub mod presentation;
pub mod species;

pub use capture::{ImageMime, ImagePayload, ValidationError};
pub use diagnosis::{DiagnosisResult, Prediction};
pub use handoff::HandoffSlot;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
}

/// Error body returned by every backend endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    /// Best human-readable text: the upstream message when present.
    pub fn describe(&self) -> String {
        match (&self.message, self.details.is_empty()) {
            (Some(message), _) => format!("{}: {}", self.error, message),
            (None, false) => format!("{}: {}", self.error, self.details.join("; ")),
            (None, true) => self.error.clone(),
        }
    }
}

impl From<&ValidationError> for ErrorBody {
    fn from(err: &ValidationError) -> Self {
        Self {
            error: err.to_string(),
            kind: Some(err.kind().to_string()),
            ..Self::default()
        }
    }
}
