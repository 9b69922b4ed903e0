//! Backend connection settings from environment variables.

use url::Url;

use crate::error::{ApiError, Result};

/// Environment variable holding the backend base URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the public (anon) API key.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Where the backend lives and the public key every request carries.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    url: Url,
    anon_key: String,
}

impl BackendConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self> {
        let mut url =
            Url::parse(url).map_err(|e| ApiError::InvalidConfiguration(format!("{URL_VAR}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfiguration(format!(
                "{URL_VAR} must be an http(s) URL"
            )));
        }
        // Endpoints are joined relative to the base, so it needs a trailing slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ApiError::ConfigurationMissing(ANON_KEY_VAR));
        }

        Ok(Self { url, anon_key })
    }

    /// Read `SUPABASE_URL` and `SUPABASE_ANON_KEY`, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = non_empty_var(URL_VAR).ok_or(ApiError::ConfigurationMissing(URL_VAR))?;
        let anon_key =
            non_empty_var(ANON_KEY_VAR).ok_or(ApiError::ConfigurationMissing(ANON_KEY_VAR))?;

        Self::new(&url, anon_key)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// First DNS label of the backend host (`abcd` for `abcd.supabase.co`).
    pub fn project_ref(&self) -> String {
        self.url
            .host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or("local")
            .to_string()
    }

    /// Prefix of every stored auth value for this project.
    pub fn storage_key(&self) -> String {
        format!("sb-{}-auth-token", self.project_ref())
    }

    /// Resolve an endpoint path such as `auth/v1/token` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidConfiguration(format!("bad endpoint {path}: {e}")))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
