//! Screen Manager MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router] pattern.
//! Tool calls are checked, then handed to the session registry on the blocking
//! thread pool since storage and multiplexer calls are synchronous.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};

use tracing::{error, info, instrument, warn};

use screen_manager_core::{Error, SecuritySettings};
use screen_manager_session::SessionRegistry;

use crate::tools::*;

/// Error code returned for bad credentials or a bad registration secret.
pub const FORBIDDEN: i32 = -32001;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Map a domain error onto an MCP error.
pub fn to_mcp_error(err: Error) -> McpError {
    let code = match &err {
        Error::Validation(_) | Error::Conflict(_) => INVALID_PARAMS,
        Error::Auth => FORBIDDEN,
        _ => INTERNAL_ERROR,
    };
    McpError::new(ErrorCode(code), err.to_string(), None)
}

async fn run_blocking<T, F>(task: F) -> Result<T, McpError>
where
    F: FnOnce() -> screen_manager_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| {
            error!("Blocking task failed: {}", e);
            McpError::new(ErrorCode(INTERNAL_ERROR), format!("Worker failed: {e}"), None)
        })?
        .map_err(to_mcp_error)
}

fn json_result<T: serde::Serialize>(response: &T, fallback: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(response).unwrap_or(fallback),
    )])
}

/// Screen Manager MCP Server
///
/// Exposes the session registry via MCP tools.
#[derive(Clone)]
pub struct ScreenManagerServer {
    /// Registry shared by every request
    registry: Arc<SessionRegistry>,
    /// Registration secret
    security: Arc<SecuritySettings>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl ScreenManagerServer {
    /// Register a user after checking the shared secret.
    pub async fn register(&self, params: RegisterParams) -> Result<RegisterResponse, McpError> {
        if !self.security.is_secret_valid(&params.secret) {
            warn!("Registration rejected: bad secret for login={}", params.login);
            return Err(McpError::new(
                ErrorCode(FORBIDDEN),
                "Forbidden".to_string(),
                None,
            ));
        }

        let registry = Arc::clone(&self.registry);
        let login = params.login.clone();
        run_blocking(move || registry.register(&params.login, &params.password_hash)).await?;

        Ok(RegisterResponse {
            login,
            message: "User registered successfully".to_string(),
        })
    }

    /// Store and provision a screen.
    pub async fn add_screen(&self, params: AddScreenParams) -> Result<AddScreenResponse, McpError> {
        let registry = Arc::clone(&self.registry);
        let name = params.name.clone();
        let script = run_blocking(move || {
            let credentials = params.credentials();
            registry.add_screen(&params.name, &params.run, &params.path, &credentials)
        })
        .await?;

        Ok(AddScreenResponse {
            name,
            script: script.display().to_string(),
            message: "Screen added successfully".to_string(),
        })
    }

    /// Remove a screen and quit its sessions.
    pub async fn kill_screen(
        &self,
        params: KillScreenParams,
    ) -> Result<KillScreenResponse, McpError> {
        let registry = Arc::clone(&self.registry);
        let name = params.name.clone();
        let terminated = run_blocking(move || {
            let credentials = params.credentials();
            registry.remove_screen(&params.name, &credentials)
        })
        .await?;

        Ok(KillScreenResponse {
            name,
            terminated,
            message: "Screen killed successfully".to_string(),
        })
    }

    /// List stored screens.
    pub async fn list_screens(
        &self,
        params: ListScreensParams,
    ) -> Result<ListScreensResponse, McpError> {
        let registry = Arc::clone(&self.registry);
        let screens = run_blocking(move || registry.list_screens(&params.credentials())).await?;
        let count = screens.len();
        Ok(ListScreensResponse { screens, count })
    }
}

#[tool_router]
impl ScreenManagerServer {
    /// Create a new server over a registry and registration settings.
    pub fn new(registry: Arc<SessionRegistry>, security: SecuritySettings) -> Self {
        Self {
            registry,
            security: Arc::new(security),
            tool_router: Self::tool_router(),
        }
    }

    /// Register a user
    #[tool(description = "Register a user; requires the shared registration secret")]
    #[instrument(skip_all)]
    async fn screen_register(
        &self,
        Parameters(params): Parameters<RegisterParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Registering user: login={}", params.login);
        let response = self.register(params).await?;
        Ok(json_result(&response, response.message.clone()))
    }

    /// Add a screen
    #[tool(description = "Store a named screen, create its directory and write its run.sh")]
    #[instrument(skip_all)]
    async fn screen_add(
        &self,
        Parameters(params): Parameters<AddScreenParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Adding screen: name={}, path={}", params.name, params.path);
        let response = self.add_screen(params).await?;
        Ok(json_result(&response, response.message.clone()))
    }

    /// Kill a screen
    #[tool(description = "Delete a screen and quit the screen sessions running under its name")]
    #[instrument(skip_all)]
    async fn screen_kill(
        &self,
        Parameters(params): Parameters<KillScreenParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Killing screen: name={}", params.name);
        let response = self.kill_screen(params).await?;
        Ok(json_result(&response, response.message.clone()))
    }

    /// List screens
    #[tool(description = "List stored screens")]
    #[instrument(skip_all)]
    async fn screen_list(
        &self,
        Parameters(params): Parameters<ListScreensParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.list_screens(params).await?;
        info!("Found {} screen(s)", response.count);
        let fallback = format!("{} screens stored", response.count);
        Ok(json_result(&response, fallback))
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for ScreenManagerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Screen Manager - register named shell commands and run them as GNU screen sessions. \
                 Use screen_register with the shared secret to create a user, screen_add to store \
                 a screen and write its run.sh, screen_kill to delete it and quit its sessions, \
                 and screen_list to review stored screens."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
