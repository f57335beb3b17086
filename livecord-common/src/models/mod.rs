// File: livecord-common/src/models/mod.rs
pub mod announcement;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod entity;

pub use announcement::LiveAnnouncement;
pub use auth::AppToken;
pub use broadcast::BroadcastSnapshot;
pub use config::{ConfigDefaults, Configuration};
pub use entity::TrackedEntity;
