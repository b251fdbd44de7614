//! Service frame configuration.

use serde::{Deserialize, Serialize};

/// Root of the remote identity API in the default deployment.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "http://web4.dev.svc.mtv1.mozilla.com/1/";

/// Remote path of the login page opened in the popup.
pub const DEFAULT_LOGIN_PATH: &str = "login";

/// Configuration for [`crate::IdentityService`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root of the remote identity API; operations are appended to it
    pub identity_base_url: String,
    /// Path of the login page, relative to `identity_base_url`
    pub login_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.into(),
            login_path: DEFAULT_LOGIN_PATH.into(),
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON configuration; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Base URL with a guaranteed trailing `/`.
    pub fn base_url(&self) -> String {
        let mut base = self.identity_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }

    /// URI of the login page, under the service's own origin.
    pub fn login_uri(&self) -> String {
        format!("{}{}", self.base_url(), self.login_path.trim_start_matches('/'))
    }
}
