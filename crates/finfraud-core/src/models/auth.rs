//! Authentication payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user, held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match self.email {
            Some(ref email) if !email.is_empty() => email.clone(),
            _ => format!("user #{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signup may or may not hand back a token. Every field the server sent is
/// kept so callers see the raw response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignupResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignupResponse {
    /// The issued token, if the server sent a usable one
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Body of `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<MeResponse> for User {
    fn from(me: MeResponse) -> Self {
        User {
            id: me.id,
            email: me.email,
        }
    }
}
