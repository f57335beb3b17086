pub mod live_poll;

pub use live_poll::{spawn_live_poll_task, DEFAULT_CHECK_INTERVAL};
