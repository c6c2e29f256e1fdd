//! # screen-manager-store
//!
//! Transactional persistence for Screen Manager.
//!
//! This crate provides:
//! - A single shared SQLite connection guarded for one logical operation at a time
//! - Parameterized execute/query with an explicit transaction boundary
//! - Tagged parameters and result cells
//! - Schema bootstrap for the `users` and `screens` tables
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it knows nothing about users or
//! screens beyond the schema it creates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod schema;
pub mod store;
pub mod value;

// Re-export commonly used types
pub use schema::init_schema;
pub use store::{PersistentStore, StoreError, StoreResult, StoreSession};
pub use value::{Cell, Param, Row};
