//! Testing utilities for screen lifecycle code.
//!
//! Provides an in-memory [`Multiplexer`] that records every call instead of
//! touching the host.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use screen_manager_core::{Error, Result};

use crate::multiplexer::{parse_listing, Multiplexer, MultiplexerSession};

/// A call observed by [`RecordingMultiplexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiplexerCall {
    /// Listing was requested
    List,
    /// Quit was requested for an identifier
    Quit(String),
    /// Start was requested
    Start {
        /// Session name
        name: String,
        /// Script path
        script: PathBuf,
        /// Working directory
        cwd: PathBuf,
    },
}

#[derive(Debug, Default)]
struct RecorderState {
    sessions: Vec<MultiplexerSession>,
    calls: Vec<MultiplexerCall>,
    next_pid: u32,
    fail_listing: bool,
    fail_quit: bool,
    fail_start: bool,
}

/// Multiplexer double that keeps sessions in memory and records calls.
#[derive(Debug, Default)]
pub struct RecordingMultiplexer {
    state: Mutex<RecorderState>,
}

impl RecordingMultiplexer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder pre-populated from `screen -ls` style output.
    pub fn with_listing(listing: &str) -> Self {
        let recorder = Self::new();
        recorder.lock().sessions = parse_listing(listing);
        recorder
    }

    /// Make every listing request fail.
    pub fn fail_listing(&self) {
        self.lock().fail_listing = true;
    }

    /// Make every quit request fail.
    pub fn fail_quit(&self) {
        self.lock().fail_quit = true;
    }

    /// Make every start request fail.
    pub fn fail_start(&self) {
        self.lock().fail_start = true;
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<MultiplexerCall> {
        self.lock().calls.clone()
    }

    /// Identifiers that were asked to quit, in order.
    pub fn quit_ids(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MultiplexerCall::Quit(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Session names still running.
    pub fn running(&self) -> Vec<String> {
        self.lock().sessions.iter().map(|s| s.name.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Multiplexer for RecordingMultiplexer {
    fn list_sessions(&self) -> Result<Vec<MultiplexerSession>> {
        let mut state = self.lock();
        state.calls.push(MultiplexerCall::List);
        if state.fail_listing {
            return Err(Error::Process("listing failed".to_string()));
        }
        Ok(state.sessions.clone())
    }

    fn quit(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MultiplexerCall::Quit(id.to_string()));
        if state.fail_quit {
            return Err(Error::Process(format!("quit {id} failed")));
        }
        state.sessions.retain(|s| s.id != id);
        Ok(())
    }

    fn start(&self, name: &str, script: &Path, cwd: &Path) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MultiplexerCall::Start {
            name: name.to_string(),
            script: script.to_path_buf(),
            cwd: cwd.to_path_buf(),
        });
        if state.fail_start {
            return Err(Error::Process(format!("start {name} failed")));
        }
        state.next_pid += 1;
        let pid = state.next_pid;
        state.sessions.push(MultiplexerSession {
            id: format!("{pid}.{name}"),
            pid,
            name: name.to_string(),
            state: Some("Detached".to_string()),
        });
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}
