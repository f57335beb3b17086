pub mod announcer;
pub mod runtime;

pub use announcer::DiscordAnnouncer;
pub use runtime::DiscordRuntime;
