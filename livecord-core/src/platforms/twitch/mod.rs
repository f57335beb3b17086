// File: livecord-core/src/platforms/twitch/mod.rs

pub mod auth;
pub mod client;
pub mod provider;
pub mod requests;

pub use auth::{AppTokenCache, ClientCredentialsExchange};
pub use client::TwitchHelixClient;
pub use provider::HelixStatusProvider;
