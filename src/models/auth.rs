use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque credential issued by the hosting chat client.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct InitData(String);

impl InitData {
    /// Returns `None` for an empty token; the host sends one when opened outside the app.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the token out of logs.
impl fmt::Debug for InitData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InitData(<{} bytes>)", self.0.len())
    }
}

/// Where the backend wants the client to go after a successful handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRedirect(String);

impl AuthRedirect {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
