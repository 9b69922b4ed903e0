//! Authentication: OAuth PKCE sign-in and session management.

mod client;
#[cfg(feature = "server")]
mod session;

pub use client::{AuthClient, DEFAULT_PROVIDER};
#[cfg(feature = "server")]
pub use session::TowerSessionStorage;
