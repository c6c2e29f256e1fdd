//! Screen registry: domain rules on top of the persistent store.
//!
//! Every row change runs inside one store session and transaction. Host side
//! effects (provisioning, teardown) run only after that session has committed
//! and been released; their failures surface as [`Error::PartialFailure`] and
//! never undo the committed row.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use screen_manager_core::{Credentials, Error, Result, Screen, User};
use screen_manager_store::{Param, PersistentStore, Row, StoreError};

use crate::orchestrator::SessionOrchestrator;

const INSERT_USER: &str = "INSERT INTO users (login, password_hash) VALUES (?, ?);";
const SELECT_USER: &str =
    "SELECT id, login, password_hash FROM users WHERE login = ? AND password_hash = ?;";
const INSERT_SCREEN: &str = "INSERT INTO screens (name, run, path) VALUES (?, ?, ?);";
const DELETE_SCREEN: &str = "DELETE FROM screens WHERE name = ?;";
const SELECT_SCREEN: &str = "SELECT id, name, run, path FROM screens WHERE name = ?;";
const SELECT_SCREENS: &str = "SELECT id, name, run, path FROM screens ORDER BY id;";

/// Stateless façade enforcing registration, authentication and uniqueness.
pub struct SessionRegistry {
    store: Arc<PersistentStore>,
    orchestrator: SessionOrchestrator,
}

impl SessionRegistry {
    /// Create a registry over a store whose schema is already initialized.
    pub fn new(store: Arc<PersistentStore>, orchestrator: SessionOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Register a user.
    pub fn register(&self, login: &str, password_hash: &str) -> Result<()> {
        if login.is_empty() || password_hash.is_empty() {
            return Err(Error::Validation(
                "Login and password_hash cannot be empty".to_string(),
            ));
        }

        self.write(
            INSERT_USER,
            &[Param::from(login), Param::from(password_hash)],
            &format!("login '{login}'"),
        )?;

        info!("User registered: login={}", login);
        Ok(())
    }

    /// Check that a user with exactly these credentials exists.
    pub fn authenticate(&self, login: &str, password_hash: &str) -> bool {
        self.find_user(login, password_hash).is_some()
    }

    /// Look up the user holding exactly these credentials.
    ///
    /// Storage failures are logged by the store and read as no match.
    pub fn find_user(&self, login: &str, password_hash: &str) -> Option<User> {
        self.store
            .query(SELECT_USER, &[Param::from(login), Param::from(password_hash)])
            .iter()
            .find_map(user_from_row)
    }

    /// Persist a screen, then provision its directory and run script.
    pub fn add_screen(
        &self,
        name: &str,
        run: &str,
        path: &str,
        credentials: &Credentials,
    ) -> Result<PathBuf> {
        self.require_auth(credentials)?;

        if name.is_empty() || path.is_empty() {
            return Err(Error::Validation(
                "Name and path cannot be empty".to_string(),
            ));
        }

        self.write(
            INSERT_SCREEN,
            &[Param::from(name), Param::from(run), Param::from(path)],
            &format!("screen '{name}'"),
        )?;
        info!("Screen stored: name={}, path={}", name, path);

        self.orchestrator
            .provision(name, run, path)
            .map_err(|e| {
                warn!("Provisioning failed for committed screen {}: {}", name, e);
                Error::partial(name, e)
            })
    }

    /// Delete a screen row, then ask the multiplexer to quit matching sessions.
    ///
    /// Deleting an unknown name succeeds and still performs the teardown.
    /// Returns the session identifiers that were asked to quit.
    pub fn remove_screen(&self, name: &str, credentials: &Credentials) -> Result<Vec<String>> {
        self.require_auth(credentials)?;

        if name.is_empty() {
            return Err(Error::Validation("Name cannot be empty".to_string()));
        }

        self.write(
            DELETE_SCREEN,
            &[Param::from(name)],
            &format!("screen '{name}'"),
        )?;
        debug!("Screen row removed (if present): name={}", name);

        self.orchestrator.terminate(name).map_err(|e| {
            warn!("Teardown failed for removed screen {}: {}", name, e);
            Error::partial(name, e)
        })
    }

    /// Read back a screen row by name.
    pub fn find_screen(&self, name: &str) -> Result<Option<Screen>> {
        let rows = self
            .store
            .lock()
            .try_query(SELECT_SCREEN, &[Param::from(name)])
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(rows.iter().find_map(screen_from_row))
    }

    /// List every stored screen.
    pub fn list_screens(&self, credentials: &Credentials) -> Result<Vec<Screen>> {
        self.require_auth(credentials)?;

        let rows = self
            .store
            .lock()
            .try_query(SELECT_SCREENS, &[])
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(rows.iter().filter_map(screen_from_row).collect())
    }

    fn require_auth(&self, credentials: &Credentials) -> Result<()> {
        if self.authenticate(&credentials.login, &credentials.password_hash) {
            Ok(())
        } else {
            warn!("Authentication failed: login={}", credentials.login);
            Err(Error::Auth)
        }
    }

    /// Run one statement in its own transaction, rolling back on failure.
    fn write(&self, sql: &str, params: &[Param], subject: &str) -> Result<()> {
        let mut session = self.store.lock();
        session
            .begin_transaction()
            .map_err(|e| translate(e, subject))?;

        if let Err(e) = session.execute(sql, params) {
            session.rollback();
            return Err(translate(e, subject));
        }

        session.commit().map_err(|e| translate(e, subject))
    }
}

fn translate(err: StoreError, subject: &str) -> Error {
    if err.is_constraint_violation() {
        Error::Conflict(subject.to_string())
    } else {
        Error::Storage(err.to_string())
    }
}

fn user_from_row(row: &Row) -> Option<User> {
    match row.as_slice() {
        [id, login, password_hash] => Some(User {
            id: id.as_i64()?,
            login: login.as_str()?.to_string(),
            password_hash: password_hash.as_str()?.to_string(),
        }),
        _ => None,
    }
}

fn screen_from_row(row: &Row) -> Option<Screen> {
    match row.as_slice() {
        [id, name, run, path] => Some(Screen {
            id: id.as_i64()?,
            name: name.as_str()?.to_string(),
            run: run.as_str().unwrap_or_default().to_string(),
            path: path.as_str().unwrap_or_default().to_string(),
        }),
        _ => None,
    }
}
