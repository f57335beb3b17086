// src/repositories/mod.rs

pub mod config_handle;
pub mod json_config;

pub use config_handle::ConfigHandle;
pub use json_config::JsonFileConfigStore;
