//! Configuration module

pub mod settings;

pub use settings::{AzureConfig, LoggingConfig, SecurityConfig, ServerConfig, Settings};
