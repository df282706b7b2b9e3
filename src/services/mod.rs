pub mod catalog;
pub mod grouping;
pub mod identity;
pub mod online_search;
pub mod platforms;
pub mod search;
pub mod shows;
pub mod watchers;

pub use online_search::OnlineSearchService;
pub use platforms::PlatformService;
pub use shows::ShowService;
pub use watchers::WatcherService;
