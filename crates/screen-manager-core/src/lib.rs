//! # screen-manager-core
//!
//! Core types for Screen Manager.
//!
//! This crate contains the fundamental types with **no internal dependencies**
//! on other screen-manager crates. It provides:
//!
//! - Error types shared by every layer
//! - Server configuration (YAML file plus environment overrides)
//! - User, screen and credential records
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other screen-manager crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod screen;

// Re-export commonly used types
pub use config::{
    DatabaseSettings, MatchMode, SecuritySettings, ServerConfig, ServerSettings, SessionSettings,
};
pub use error::{Error, Result};
pub use screen::{Credentials, Screen, User};
