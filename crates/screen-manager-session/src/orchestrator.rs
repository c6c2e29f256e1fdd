//! Host side effects for persisted screens.

use std::fs::{self, DirBuilder, Permissions};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use screen_manager_core::{Error, Result, SessionSettings};

use crate::multiplexer::{GnuScreen, Multiplexer};

/// Permission bits for provisioned directories and run scripts.
const OPEN_MODE: u32 = 0o777;

/// Provisions run scripts and drives the session multiplexer.
pub struct SessionOrchestrator {
    multiplexer: Arc<dyn Multiplexer>,
    settings: SessionSettings,
}

impl SessionOrchestrator {
    /// Create an orchestrator over the given multiplexer.
    pub fn new(multiplexer: Arc<dyn Multiplexer>, settings: SessionSettings) -> Self {
        Self {
            multiplexer,
            settings,
        }
    }

    /// Create an orchestrator driving GNU screen as configured.
    pub fn with_gnu_screen(settings: SessionSettings) -> Self {
        let screen = GnuScreen::new(settings.multiplexer.clone());
        Self::new(Arc::new(screen), settings)
    }

    /// The multiplexer in use.
    pub fn multiplexer(&self) -> &dyn Multiplexer {
        self.multiplexer.as_ref()
    }

    /// Location of the run script for a screen directory.
    pub fn script_path(&self, path: &str) -> PathBuf {
        Path::new(path).join(&self.settings.script_name)
    }

    /// Create `path`, write `run` verbatim into its run script and open the
    /// script's permissions to everyone.
    ///
    /// With autostart enabled a detached session named `name` is started on
    /// the fresh script. Returns the script path.
    pub fn provision(&self, name: &str, run: &str, path: &str) -> Result<PathBuf> {
        let dir = Path::new(path);
        DirBuilder::new()
            .recursive(true)
            .mode(OPEN_MODE)
            .create(dir)
            .map_err(|e| Error::Filesystem(format!("Failed to create directory {path}: {e}")))?;

        let script = self.script_path(path);
        fs::write(&script, run).map_err(|e| {
            Error::Filesystem(format!("Failed to write {}: {e}", script.display()))
        })?;

        fs::set_permissions(&script, Permissions::from_mode(OPEN_MODE)).map_err(|e| {
            Error::Filesystem(format!(
                "Failed to set execute permissions on {}: {e}",
                script.display()
            ))
        })?;

        info!("Provisioned screen: name={}, script={}", name, script.display());

        if self.settings.autostart {
            self.multiplexer.start(name, &script, dir)?;
        }

        Ok(script)
    }

    /// Ask every multiplexer session matching `name` to quit.
    ///
    /// No match is not an error. The directory and run script are left in
    /// place. Returns the identifiers that were asked to quit.
    pub fn terminate(&self, name: &str) -> Result<Vec<String>> {
        let targets: Vec<String> = self
            .multiplexer
            .list_sessions()?
            .into_iter()
            .filter(|session| session.matches(name, self.settings.match_mode))
            .map(|session| session.id)
            .collect();

        if targets.is_empty() {
            debug!("No {} session matches '{}'", self.multiplexer.name(), name);
            return Ok(targets);
        }

        let mut failures = Vec::new();
        for id in &targets {
            if let Err(e) = self.multiplexer.quit(id) {
                warn!("Failed to quit session {}: {}", id, e);
                failures.push(e.to_string());
            }
        }

        if !failures.is_empty() {
            return Err(Error::Process(failures.join("; ")));
        }

        info!("Terminated {} session(s) for '{}'", targets.len(), name);
        Ok(targets)
    }
}
