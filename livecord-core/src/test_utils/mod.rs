// File: livecord-core/src/test_utils/mod.rs
//! In-memory fakes for the engine's external seams.

pub mod fakes;

pub use fakes::{
    snapshot, CountingExchange, GatewayCall, ManualClock, MemoryConfigStore, RecordingGateway,
    ScriptedStatusProvider,
};
