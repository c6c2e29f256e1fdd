//! MCP Tool Types
//!
//! Parameter and response types for every screen manager tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use screen_manager_core::{Credentials, Screen};

// =============================================================================
// Registration
// =============================================================================

/// Parameters for screen_register
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterParams {
    /// Login to register
    pub login: String,

    /// Opaque credential string, stored and compared as-is
    pub password_hash: String,

    /// Shared registration secret
    pub secret: String,
}

/// Response for screen_register
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterResponse {
    /// Registered login
    pub login: String,

    /// Success message
    pub message: String,
}

// =============================================================================
// Screen Lifecycle
// =============================================================================

/// Parameters for screen_add
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddScreenParams {
    /// Unique screen name, also used as the screen session name
    pub name: String,

    /// Shell command written verbatim into the run script
    pub run: String,

    /// Working directory that receives the run script
    pub path: String,

    /// Caller login
    pub login: String,

    /// Caller credential string
    pub password_hash: String,
}

impl AddScreenParams {
    /// Credentials presented with the request.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password_hash.clone())
    }
}

/// Response for screen_add
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddScreenResponse {
    /// Screen name
    pub name: String,

    /// Path of the generated run script
    pub script: String,

    /// Success message
    pub message: String,
}

/// Parameters for screen_kill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KillScreenParams {
    /// Screen to remove and terminate
    pub name: String,

    /// Caller login
    pub login: String,

    /// Caller credential string
    pub password_hash: String,
}

impl KillScreenParams {
    /// Credentials presented with the request.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password_hash.clone())
    }
}

/// Response for screen_kill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KillScreenResponse {
    /// Screen name
    pub name: String,

    /// Multiplexer sessions that were asked to quit
    pub terminated: Vec<String>,

    /// Success message
    pub message: String,
}

/// Parameters for screen_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListScreensParams {
    /// Caller login
    pub login: String,

    /// Caller credential string
    pub password_hash: String,
}

impl ListScreensParams {
    /// Credentials presented with the request.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password_hash.clone())
    }
}

/// Response for screen_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListScreensResponse {
    /// Stored screens, oldest first
    pub screens: Vec<Screen>,

    /// Total count
    pub count: usize,
}
