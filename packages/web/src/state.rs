use std::sync::Arc;

use api::auth::TowerSessionStorage;
use api::{AuthClient, BackendClient, BookmarkRepository, RouteGuard, Session};
use url::Url;

use crate::settings::Settings;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub guard: Arc<RouteGuard>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(backend: BackendClient, settings: Settings) -> Self {
        Self {
            backend: Arc::new(backend),
            guard: Arc::new(RouteGuard::default()),
            settings: Arc::new(settings),
        }
    }

    /// Auth client bound to the request's server-side session.
    pub fn auth_client(&self, session: tower_sessions::Session) -> AuthClient<TowerSessionStorage> {
        AuthClient::new(self.backend.clone(), TowerSessionStorage::new(session))
            .with_provider(self.settings.auth.provider.clone())
    }

    pub fn repository(&self, session: Option<&Session>) -> BookmarkRepository {
        BookmarkRepository::for_session(self.backend.clone(), session)
    }

    /// Absolute URL of the OAuth callback route.
    pub fn callback_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.settings.server.public_url)?.join("/auth/callback")
    }
}
