//! User and screen records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A registered caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    /// Generated row identifier
    pub id: i64,
    /// Unique login
    pub login: String,
    /// Opaque credential string, compared by equality
    pub password_hash: String,
}

/// A named session definition: a shell command and its working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Screen {
    /// Generated row identifier
    pub id: i64,
    /// Unique screen name, also used as the multiplexer session name
    pub name: String,
    /// Shell command written verbatim into the run script
    pub run: String,
    /// Working and artifact directory
    pub path: String,
}

/// Login and opaque credential presented with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login
    pub login: String,
    /// Opaque credential string
    pub password_hash: String,
}

impl Credentials {
    /// Create credentials from a login and credential string.
    pub fn new(login: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let creds = Credentials::new("alice", "secret-hash");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret-hash"));
    }

    #[test]
    fn test_screen_serialization() {
        let screen = Screen {
            id: 7,
            name: "s1".to_string(),
            run: "echo hi".to_string(),
            path: "/tmp/x".to_string(),
        };

        let json = serde_json::to_string(&screen).unwrap();
        let deserialized: Screen = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, screen);
    }
}
