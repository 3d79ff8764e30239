//! Configuration management
//!
//! Configuration loading from TOML files and environment variables, with
//! validation and defaults suited to a single-lobby deployment.

pub mod app;

pub use app::{
    validate_config, AppConfig, AudioSettings, MatchSettings, ServiceSettings,
};
