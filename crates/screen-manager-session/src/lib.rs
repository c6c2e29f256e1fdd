//! # screen-manager-session
//!
//! Screen lifecycle management for Screen Manager.
//!
//! This crate provides:
//! - Screen registry (register, authenticate, add, remove, list)
//! - Run script and directory provisioning
//! - Session multiplexer control (listing, start, quit)
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on screen-manager-core
//! and screen-manager-store to turn committed rows into host side effects.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod multiplexer;
pub mod orchestrator;
pub mod registry;
pub mod testing;

// Re-export commonly used types
pub use multiplexer::{parse_listing, GnuScreen, Multiplexer, MultiplexerSession};
pub use orchestrator::SessionOrchestrator;
pub use registry::SessionRegistry;
