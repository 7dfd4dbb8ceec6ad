//! # harbor-admin
//!
//! Admin and reporting commands for Harbor POS.
//!
//! ## Module Organization
//! ```text
//! harbor_admin/
//! ├── lib.rs       ◄─── You are here
//! ├── cli.rs       ◄─── clap definition
//! ├── config.rs    ◄─── Environment configuration
//! ├── error.rs     ◄─── AdminError
//! └── commands/    ◄─── One module per command
//! ```
//!
//! The binary in `main.rs` only wires these together; everything here is
//! testable without a process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use config::{AdminConfig, ConfigError};
pub use error::{AdminError, AdminResult};
