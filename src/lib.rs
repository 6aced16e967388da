//! Provisioning configuration of the Ironlink ESP32 sensor node.
//!
//! `build.rs` reads `cfg.toml`, checks it against the tracked
//! `cfg.example.toml` template and compiles its values into [`config`].
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod parity;
pub mod schema;
pub mod telemetry;
pub mod topic;

pub use config::CONFIG;
pub use schema::{Config, Key};
