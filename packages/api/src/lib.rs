//! # API crate — backend client and the components built on it
//!
//! Everything that talks to the hosted backend (auth service, data API,
//! realtime websocket) lives here. The entry point is [`BackendClient`], built
//! once from [`BackendConfig`] and shared as `Arc<BackendClient>`; every other
//! component takes it as a constructor argument.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | — | OAuth PKCE sign-in, code exchange, session refresh and sign-out; `TowerSessionStorage` behind `server` |
//! | [`bookmarks`] | — | Bookmark CRUD against the data API, input validation, connectivity check |
//! | [`callback`] | — | The OAuth callback state machine and its redirect targets |
//! | [`client`] | — | Shared HTTP client, auth headers and error-body extraction |
//! | [`config`] | — | `SUPABASE_URL` / `SUPABASE_ANON_KEY` handling |
//! | [`error`] | — | [`ApiError`], the taxonomy every operation returns |
//! | [`feed`] | — | [`BookmarkFeed`], a mounted list kept in sync by the live channel |
//! | [`guard`] | — | [`RouteGuard`] redirect decisions |
//! | [`realtime`] | — | Live change subscription over the realtime websocket |

pub mod auth;
pub mod bookmarks;
pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod guard;
pub mod realtime;

pub use auth::AuthClient;
pub use bookmarks::BookmarkRepository;
pub use callback::CallbackParams;
pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::{ApiError, Result};
pub use feed::BookmarkFeed;
pub use guard::{GuardDecision, RouteGuard};
pub use realtime::{ChangeHandler, Subscription};

pub use store::{AuthUser, Bookmark, BookmarkList, LiveChange, Session};
