//! Single-connection SQLite store with an explicit transaction boundary.
//!
//! The connection and the in-flight transaction flag live behind one mutex.
//! [`PersistentStore::lock`] hands out a [`StoreSession`] that holds the guard
//! for a whole logical operation (begin, statements, commit or rollback), so
//! concurrent callers never interleave inside each other's transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, Statement};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::value::{Cell, Param, Row};

/// Failure of a single store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection could not be opened
    #[error("Database is not opened")]
    Closed,

    /// The statement could not be prepared
    #[error("Failed to prepare statement: {0}")]
    Prepare(#[source] rusqlite::Error),

    /// A parameter could not be bound
    #[error("Failed to bind parameter {index}: {source}")]
    Bind {
        /// One-based parameter position
        index: usize,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A UNIQUE (or other) constraint rejected the statement
    #[error("Constraint violation: {0}")]
    Constraint(#[source] rusqlite::Error),

    /// Stepping the statement failed
    #[error("Execution failed: {0}")]
    Step(#[source] rusqlite::Error),
}

impl StoreError {
    fn step(err: rusqlite::Error) -> Self {
        let constraint = matches!(
            &err,
            rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
        );
        if constraint {
            StoreError::Constraint(err)
        } else {
            StoreError::Step(err)
        }
    }

    /// Whether the failure was a constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

struct StoreState {
    conn: Option<Connection>,
    in_transaction: bool,
}

/// Owner of the single database connection.
pub struct PersistentStore {
    path: String,
    state: Mutex<StoreState>,
}

impl PersistentStore {
    /// Open the database file at `path`.
    ///
    /// A failed open is logged and leaves the store closed; every later
    /// operation then fails with [`StoreError::Closed`].
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let conn = match Connection::open(path) {
            Ok(conn) => {
                info!("Opened database: {}", path.display());
                Some(conn)
            }
            Err(e) => {
                error!("Can't open database {}: {}", path.display(), e);
                None
            }
        };
        Self::with_connection(path.display().to_string(), conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Self {
        let conn = match Connection::open_in_memory() {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!("Can't open in-memory database: {}", e);
                None
            }
        };
        Self::with_connection(":memory:".to_string(), conn)
    }

    fn with_connection(path: String, conn: Option<Connection>) -> Self {
        Self {
            path,
            state: Mutex::new(StoreState {
                conn,
                in_transaction: false,
            }),
        }
    }

    /// Location the store was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the connection was opened successfully.
    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    /// Take exclusive access to the connection for one logical operation.
    ///
    /// Blocks while another session is alive.
    pub fn lock(&self) -> StoreSession<'_> {
        let state = self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Store lock was poisoned, recovering");
            poisoned.into_inner()
        });
        StoreSession { state }
    }

    /// Run a single statement under its own short-lived session.
    pub fn execute(&self, sql: &str, params: &[Param]) -> StoreResult<()> {
        self.lock().execute(sql, params)
    }

    /// Run a single query under its own short-lived session.
    ///
    /// Failures are logged and yield an empty row set.
    pub fn query(&self, sql: &str, params: &[Param]) -> Vec<Row> {
        self.lock().query(sql, params)
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Exclusive handle on the store for the duration of one logical operation.
///
/// Dropping a session while a transaction is open rolls it back.
pub struct StoreSession<'a> {
    state: MutexGuard<'a, StoreState>,
}

impl StoreSession<'_> {
    /// Whether the underlying connection is open.
    pub fn is_open(&self) -> bool {
        self.state.conn.is_some()
    }

    /// Whether a transaction is in flight.
    pub fn in_transaction(&self) -> bool {
        self.state.in_transaction
    }

    /// Start a transaction. No-op if one is already in flight.
    pub fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.state.in_transaction {
            return Ok(());
        }
        self.execute("BEGIN TRANSACTION;", &[])?;
        self.state.in_transaction = true;
        Ok(())
    }

    /// Commit the in-flight transaction.
    ///
    /// A failed commit rolls back before reporting the failure. Succeeds
    /// trivially when no transaction is in flight.
    pub fn commit(&mut self) -> StoreResult<()> {
        if !self.state.in_transaction {
            return Ok(());
        }
        if let Err(e) = self.execute("COMMIT;", &[]) {
            self.rollback();
            return Err(e);
        }
        self.state.in_transaction = false;
        Ok(())
    }

    /// Roll back the in-flight transaction, if any.
    pub fn rollback(&mut self) {
        if !self.state.in_transaction {
            return;
        }
        if let Err(e) = self.execute("ROLLBACK;", &[]) {
            warn!("Rollback failed: {}", e);
        }
        self.state.in_transaction = false;
    }

    /// Prepare, bind and step `sql` once.
    ///
    /// A statement that matches no rows still succeeds.
    pub fn execute(&self, sql: &str, params: &[Param]) -> StoreResult<()> {
        let conn = self.connection()?;
        run_statement(conn, sql, params).map_err(|e| {
            error!("{} (sql: {})", e, sql);
            e
        })
    }

    /// Run `sql` and materialize every result row.
    ///
    /// Failures are logged and yield an empty row set.
    pub fn query(&self, sql: &str, params: &[Param]) -> Vec<Row> {
        self.try_query(sql, params).unwrap_or_default()
    }

    /// Run `sql` and materialize every result row, reporting failures.
    pub fn try_query(&self, sql: &str, params: &[Param]) -> StoreResult<Vec<Row>> {
        let conn = self.connection()?;
        collect_rows(conn, sql, params).map_err(|e| {
            error!("{} (sql: {})", e, sql);
            e
        })
    }

    fn connection(&self) -> StoreResult<&Connection> {
        self.state.conn.as_ref().ok_or_else(|| {
            error!("Database is not opened");
            StoreError::Closed
        })
    }
}

impl Drop for StoreSession<'_> {
    fn drop(&mut self) {
        if self.state.in_transaction {
            debug!("Session released with an open transaction, rolling back");
            self.rollback();
        }
    }
}

fn bind_parameters(stmt: &mut Statement<'_>, params: &[Param]) -> StoreResult<()> {
    for (i, param) in params.iter().enumerate() {
        let index = i + 1;
        stmt.raw_bind_parameter(index, param)
            .map_err(|source| StoreError::Bind { index, source })?;
    }
    Ok(())
}

fn run_statement(conn: &Connection, sql: &str, params: &[Param]) -> StoreResult<()> {
    let mut stmt = conn.prepare(sql).map_err(StoreError::Prepare)?;
    bind_parameters(&mut stmt, params)?;
    let mut rows = stmt.raw_query();
    rows.next().map_err(StoreError::step)?;
    Ok(())
}

fn collect_rows(conn: &Connection, sql: &str, params: &[Param]) -> StoreResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql).map_err(StoreError::Prepare)?;
    bind_parameters(&mut stmt, params)?;
    let column_count = stmt.column_count();

    let mut results = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(StoreError::step)? {
        let mut cells = Vec::with_capacity(column_count);
        for col in 0..column_count {
            let value = row.get_ref(col).map_err(StoreError::step)?;
            cells.push(Cell::from(value));
        }
        results.push(cells);
    }
    Ok(results)
}
