// File: livecord-core/src/presence/mod.rs

pub mod engine;
pub mod persistence;
pub mod table;

pub use engine::{NotificationEngine, PassReport};
pub use persistence::PersistenceBridge;
pub use table::{PresenceRecord, PresenceState, PresenceTable};
