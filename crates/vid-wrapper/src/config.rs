//! Wrapper configuration.

use serde::{Deserialize, Serialize};

/// Origin of the identity service in the default deployment.
pub const DEFAULT_IDENTITY_ORIGIN: &str = "http://web4.dev.svc.mtv1.mozilla.com";

/// Well-known path of the service frame document.
pub const DEFAULT_SERVICE_PATH: &str = "/s/html/service_iframe.html";

/// Popup geometry used when a `popup` request leaves a field unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupDefaults {
    /// Screen x of the window's left edge, in pixels
    pub left: u32,
    /// Screen y of the window's top edge, in pixels
    pub top: u32,
    /// Window height in pixels
    pub height: u32,
    /// Window width in pixels
    pub width: u32,
}

impl Default for PopupDefaults {
    fn default() -> Self {
        Self {
            left: 80,
            top: 80,
            height: 400,
            width: 400,
        }
    }
}

/// Configuration for [`crate::WrapperEndpoint`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// The only origin the wrapper talks to or accepts messages from
    pub identity_origin: String,
    /// Path of the service frame under `identity_origin`
    pub service_path: String,
    /// Popup geometry defaults
    pub popup_defaults: PopupDefaults,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            identity_origin: DEFAULT_IDENTITY_ORIGIN.into(),
            service_path: DEFAULT_SERVICE_PATH.into(),
            popup_defaults: PopupDefaults::default(),
        }
    }
}

impl WrapperConfig {
    /// Parse a JSON configuration; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// URL loaded into the hidden service frame.
    pub fn service_url(&self) -> String {
        format!(
            "{}/{}",
            self.identity_origin.trim_end_matches('/'),
            self.service_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_url() {
        assert_eq!(
            WrapperConfig::default().service_url(),
            "http://web4.dev.svc.mtv1.mozilla.com/s/html/service_iframe.html"
        );
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            WrapperConfig::from_json(r#"{"identity_origin": "http://localhost:8080/"}"#).unwrap();
        assert_eq!(config.identity_origin, "http://localhost:8080/");
        assert_eq!(config.service_url(), "http://localhost:8080/s/html/service_iframe.html");
        assert_eq!(config.popup_defaults, PopupDefaults::default());
    }

    #[test]
    fn test_from_json_popup_defaults() {
        let config = WrapperConfig::from_json(r#"{"popup_defaults": {"width": 600}}"#).unwrap();
        assert_eq!(config.popup_defaults.width, 600);
        assert_eq!(config.popup_defaults.height, 400);
    }
}
