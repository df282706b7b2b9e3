pub mod catalog;
pub mod identity;
pub mod platform;
pub mod show;
pub mod watcher;

pub use catalog::{
    OnlineShowSearchResult, TvMazeExternals, TvMazeImage, TvMazeNetwork, TvMazeSearchResult,
    TvMazeSeason, TvMazeShow,
};
pub use identity::{Account, CreateUserRequest, User};
pub use platform::Platform;
pub use show::{
    AddShowRequest, EditShowRequest, SearchShowRow, ShowForEdit, ShowGroupItem, ShowRow,
    ShowStatus, WatchStatus,
};
pub use watcher::{CreateWatcherRequest, RenameWatcherRequest, Watcher, WatcherWithUserInfo};
