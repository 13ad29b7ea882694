//! # Waypane - Minimal Wayland SHM Client
//!
//! A deliberately small Wayland client: it connects to the compositor,
//! discovers the core globals, allocates one shared-memory buffer, fills it
//! with a single color, and commits it to a toplevel surface. Everything
//! hard (wire protocol, object lifetimes, event dispatch) lives in
//! `wayland-client`; this crate is the thin sequence on top.
//!
//! ## Architecture
//!
//! - `client`: connection, global discovery, surface setup, frame submission
//! - `shm`: anonymous shared-memory buffer allocation and mapping
//! - `config`: configuration parsing and management

pub mod client;
pub mod config;
pub mod shm;

// Re-export main types for easy access
pub use client::WaypaneClient;
pub use config::WaypaneConfig;
pub use shm::ShmCanvas;

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Waypane
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
