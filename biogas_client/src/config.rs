use std::time::Duration;

use url::Url;

use crate::{ClientError, ClientResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Absolute URL of the backend (or of the reverse proxy in front of it).
    /// Endpoint paths are appended to it, so it may carry a path prefix.
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    /// Where the user is sent to sign in again once the session is gone.
    pub login_entry_point: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: concat!("biogas-client/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout: Some(Duration::from_secs(30)),
            login_entry_point: "/login".to_owned(),
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("BIOGAS_API_URL must be set"));
        }
        let parsed = Url::parse(self.base_url.trim())?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(
                "base url must use http or https",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ClientError::InvalidConfig("user_agent must be set"));
        }
        Ok(())
    }

    /// The base URL with a trailing slash, ready for `Url::join`.
    pub fn base(&self) -> ClientResult<Url> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}
