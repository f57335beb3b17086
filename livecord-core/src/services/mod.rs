
// File: src/services/mod.rs

pub mod admin_commands;
pub mod discord;

pub use admin_commands::{AdminCommand, AdminCommandService, RuntimeInfo};
