pub mod auth_traits;
pub mod clock;
pub mod platform_traits;
pub mod repository_traits;

pub use auth_traits::TokenExchange;
pub use clock::{Clock, SystemClock};
pub use platform_traits::{AnnouncementGateway, StatusProvider};
pub use repository_traits::ConfigStore;
