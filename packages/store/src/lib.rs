pub mod list;
pub mod models;
pub mod session;
pub mod storage;

mod memory;
pub use memory::{MemoryStorage, NoopStorage};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod browser;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use browser::BrowserStorage;

pub use list::BookmarkList;
pub use models::{Bookmark, LiveChange};
pub use session::{AuthUser, Session};
pub use storage::SessionStorage;
