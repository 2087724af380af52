//! Configuration management
//!
//! Settlement policy, parallel verification, snapshot location and log
//! level, read from an optional TOML file and the environment.

pub mod settings;

pub use settings::{Config, Settings, GLOBAL_CONFIG};
