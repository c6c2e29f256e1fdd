//! Schema bootstrap for the `users` and `screens` tables.

use tracing::{info, warn};

use crate::store::{PersistentStore, StoreResult};

/// DDL for registered users.
pub const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    login TEXT UNIQUE, \
    password_hash TEXT\
    );";

/// DDL for screen definitions.
pub const CREATE_SCREENS: &str = "CREATE TABLE IF NOT EXISTS screens (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    name TEXT UNIQUE, \
    run TEXT, \
    path TEXT\
    );";

const DROP_USERS: &str = "DROP TABLE IF EXISTS users;";
const DROP_SCREENS: &str = "DROP TABLE IF EXISTS screens;";

/// Create both tables if absent, in one transaction.
///
/// With `drop_existing` both tables are dropped first (destructive reset).
pub fn init_schema(store: &PersistentStore, drop_existing: bool) -> StoreResult<()> {
    let mut session = store.lock();
    session.begin_transaction()?;

    if drop_existing {
        warn!("Dropping users and screens tables");
        session.execute(DROP_USERS, &[])?;
        session.execute(DROP_SCREENS, &[])?;
    }

    session.execute(CREATE_USERS, &[])?;
    session.execute(CREATE_SCREENS, &[])?;
    session.commit()?;

    info!("Schema ready (reset: {})", drop_existing);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Param;

    fn user_count(store: &PersistentStore) -> i64 {
        store.query("SELECT COUNT(*) FROM users;", &[])[0][0]
            .as_i64()
            .unwrap()
    }

    #[test]
    fn test_init_creates_tables() {
        let store = PersistentStore::open_in_memory();
        init_schema(&store, false).unwrap();

        let rows = store.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'screens') ORDER BY name;",
            &[],
        );
        let names: Vec<_> = rows.iter().filter_map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["screens", "users"]);
    }

    #[test]
    fn test_init_is_idempotent_and_keeps_rows() {
        let store = PersistentStore::open_in_memory();
        init_schema(&store, false).unwrap();
        store
            .execute(
                "INSERT INTO users (login, password_hash) VALUES (?, ?);",
                &[Param::from("alice"), Param::from("h")],
            )
            .unwrap();

        init_schema(&store, false).unwrap();
        assert_eq!(user_count(&store), 1);
    }

    #[test]
    fn test_init_with_drop_resets_rows() {
        let store = PersistentStore::open_in_memory();
        init_schema(&store, false).unwrap();
        store
            .execute(
                "INSERT INTO users (login, password_hash) VALUES (?, ?);",
                &[Param::from("alice"), Param::from("h")],
            )
            .unwrap();

        init_schema(&store, true).unwrap();
        assert_eq!(user_count(&store), 0);
    }

    #[test]
    fn test_unique_constraints() {
        let store = PersistentStore::open_in_memory();
        init_schema(&store, false).unwrap();

        let insert = "INSERT INTO screens (name, run, path) VALUES (?, ?, ?);";
        let params = [Param::from("s1"), Param::from("echo"), Param::from("/tmp")];
        store.execute(insert, &params).unwrap();
        let err = store.execute(insert, &params).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_init_on_closed_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentStore::open(dir.path().join("no/such/dir.db"));
        assert!(init_schema(&store, false).is_err());
    }
}
