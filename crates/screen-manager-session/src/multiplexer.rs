//! Session multiplexer control.
//!
//! The production backend drives GNU `screen`. Sessions are discovered through
//! the structured `screen -ls` listing, where each entry is identified as
//! `<pid>.<name>` and followed by tab-separated state columns. Names may
//! contain spaces.

use std::path::Path;
use std::process::Command;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use screen_manager_core::{Error, MatchMode, Result};

lazy_static! {
    static ref LISTING_ENTRY: Regex =
        Regex::new(r"^\s*(\d+)\.([^\t]+)(?:\t(.*))?$").expect("valid listing regex");
    static ref LISTING_STATE: Regex =
        Regex::new(r"\(([^()]*)\)\s*$").expect("valid state regex");
}

/// One session reported by the multiplexer listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplexerSession {
    /// Full identifier (`<pid>.<name>`), accepted by `screen -S`
    pub id: String,
    /// Process ID of the session
    pub pid: u32,
    /// Session name
    pub name: String,
    /// Trailing state such as `Detached` or `Attached`, if reported
    pub state: Option<String>,
}

impl MultiplexerSession {
    /// Whether this session is targeted by a teardown of `name`.
    pub fn matches(&self, name: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Exact => self.name == name,
            MatchMode::Substring => self.id.contains(name),
        }
    }
}

/// Parse `screen -ls` output into session entries.
///
/// Header and footer lines ("There are screens on:", "No Sockets found")
/// are skipped.
pub fn parse_listing(output: &str) -> Vec<MultiplexerSession> {
    output
        .lines()
        .filter_map(|line| {
            let caps = LISTING_ENTRY.captures(line)?;
            let pid = caps[1].parse().ok()?;
            let name = caps[2].trim_end().to_string();
            if name.is_empty() {
                return None;
            }
            let state = caps
                .get(3)
                .and_then(|rest| LISTING_STATE.captures(rest.as_str()))
                .map(|state| state[1].to_string());
            Some(MultiplexerSession {
                id: format!("{}.{}", &caps[1], name),
                pid,
                name,
                state,
            })
        })
        .collect()
}

/// Host facility that runs and lists named long-lived terminal sessions.
pub trait Multiplexer: Send + Sync {
    /// List the sessions currently known to the multiplexer.
    fn list_sessions(&self) -> Result<Vec<MultiplexerSession>>;

    /// Ask the session with the given identifier to quit.
    fn quit(&self, id: &str) -> Result<()>;

    /// Start a detached session named `name` running `script` inside `cwd`.
    fn start(&self, name: &str, script: &Path, cwd: &Path) -> Result<()>;

    /// Check if the multiplexer binary is available.
    fn is_available(&self) -> bool;

    /// Multiplexer name for logging.
    fn name(&self) -> &str;
}

/// GNU screen backend.
#[derive(Debug, Clone)]
pub struct GnuScreen {
    binary: String,
}

impl GnuScreen {
    /// Create a backend invoking the given `screen` binary.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }
}

impl Default for GnuScreen {
    fn default() -> Self {
        Self::new("screen")
    }
}

impl Multiplexer for GnuScreen {
    fn list_sessions(&self) -> Result<Vec<MultiplexerSession>> {
        // `screen -ls` exits non-zero both with and without sessions, so only
        // a failure to run it counts.
        let output = self
            .command()
            .arg("-ls")
            .output()
            .map_err(|e| Error::Process(format!("Failed to run {} -ls: {e}", self.binary)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let sessions = parse_listing(&stdout);
        debug!("{} lists {} session(s)", self.binary, sessions.len());
        Ok(sessions)
    }

    fn quit(&self, id: &str) -> Result<()> {
        let status = self
            .command()
            .arg("-S")
            .arg(id)
            .arg("-X")
            .arg("quit")
            .status()
            .map_err(|e| Error::Process(format!("Failed to run {}: {e}", self.binary)))?;

        if !status.success() {
            return Err(Error::Process(format!(
                "{} -S {id} -X quit exited with {status}",
                self.binary
            )));
        }

        info!("Quit screen session: {}", id);
        Ok(())
    }

    fn start(&self, name: &str, script: &Path, cwd: &Path) -> Result<()> {
        let status = self
            .command()
            .arg("-dmS")
            .arg(name)
            .arg("sh")
            .arg(script)
            .current_dir(cwd)
            .status()
            .map_err(|e| Error::Process(format!("Failed to run {}: {e}", self.binary)))?;

        if !status.success() {
            return Err(Error::Process(format!(
                "{} -dmS {name} exited with {status}",
                self.binary
            )));
        }

        info!("Started screen session: {} ({})", name, script.display());
        Ok(())
    }

    fn is_available(&self) -> bool {
        Command::new("which")
            .arg(&self.binary)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "screen"
    }
}
