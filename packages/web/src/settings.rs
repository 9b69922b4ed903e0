use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Origin the browser uses to reach us; the OAuth callback hangs off it.
    pub public_url: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            public_url: "http://localhost:3000".into(),
        }
    }
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub provider: String,
    pub secure_cookies: bool,
    pub session_days: i64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            provider: api::auth::DEFAULT_PROVIDER.into(),
            secure_cookies: false,
            session_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Log {
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub auth: Auth,
    pub log: Log,
}

impl Settings {
    /// Defaults, then `config.toml` if present, then `BOOKMARKS__*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(Environment::with_prefix("BOOKMARKS").separator("__"))
    }

    fn build(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let config = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.public_url", defaults.server.public_url)?
            .set_default("auth.provider", defaults.auth.provider)?
            .set_default("auth.secure_cookies", defaults.auth.secure_cookies)?
            .set_default("auth.session_days", defaults.auth.session_days)?
            .set_default("log.json", defaults.log.json)?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment.try_parsing(true))
            .build()?;

        config.try_deserialize()
    }
}
