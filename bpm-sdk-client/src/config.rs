use crate::error::EngineError;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication material attached to every request.
#[derive(Clone, Debug)]
pub enum Credentials {
    Basic { user: String, password: String },
    Bearer { token: String },
}

/// Connection settings for the engine's REST root.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Start building a config for the given REST root,
    /// e.g. `http://localhost:8080/engine-rest`.
    pub fn builder(base_url: &str) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.to_owned(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct ClientConfigBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl ClientConfigBuilder {
    pub fn basic_auth(mut self, user: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::Basic {
            user: user.to_owned(),
            password: password.to_owned(),
        });
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.credentials = Some(Credentials::Bearer {
            token: token.to_owned(),
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig, EngineError> {
        // a trailing slash would produce empty path segments later
        let trimmed = self.base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| EngineError::InvalidRequest(format!("base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::InvalidRequest(format!(
                "base url is not an http root: {trimmed}"
            )));
        }
        Ok(ClientConfig {
            base_url,
            credentials: self.credentials,
            timeout: self.timeout,
        })
    }
}
