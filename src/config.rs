//! Preview configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Tokens granted to the sandbox unless the host overrides them.
pub const DEFAULT_SANDBOX_TOKENS: [&str; 3] = ["allow-scripts", "allow-forms", "allow-same-origin"];

/// Tokens that would let the sandbox navigate or escape the host window.
const FORBIDDEN_SANDBOX_TOKENS: [&str; 4] = [
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
    "allow-top-navigation-to-custom-protocols",
    "allow-popups-to-escape-sandbox",
];

/// Runtime asset URLs injected into documents that contain components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CdnLinks {
    pub react: String,
    pub react_dom: String,
    pub react_router: String,
    /// Only injected when a `.tsx` file is present.
    pub typescript: String,
}

impl Default for CdnLinks {
    fn default() -> Self {
        Self {
            react: "https://unpkg.com/react@18/umd/react.development.js".to_string(),
            react_dom: "https://unpkg.com/react-dom@18/umd/react-dom.development.js".to_string(),
            react_router:
                "https://unpkg.com/react-router-dom@6.16.0/dist/umd/react-router-dom.production.min.js"
                    .to_string(),
            typescript: "https://unpkg.com/typescript@5.2.0/lib/typescript.js".to_string(),
        }
    }
}

/// What happens to files after they leave the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Removed files stay available to every later build pass.
    #[default]
    Unbounded,
    /// Removed files are dropped once they are neither the current page nor
    /// reachable from the files of the last successful pass.
    EvictUnreferenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    pub cdn: CdnLinks,
    /// Stem of the component that is mounted automatically.
    pub entry_component: String,
    /// Element id the entry component renders into.
    pub mount_id: String,
    pub default_page: String,
    pub auto_refresh_interval_ms: u64,
    pub sandbox: Vec<String>,
    pub retention: RetentionPolicy,
    /// Path segment between the origin and the encoded snapshot in share links.
    pub share_path: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cdn: CdnLinks::default(),
            entry_component: "App".to_string(),
            mount_id: "app".to_string(),
            default_page: "index.html".to_string(),
            auto_refresh_interval_ms: 3000,
            sandbox: DEFAULT_SANDBOX_TOKENS.iter().map(|t| t.to_string()).collect(),
            retention: RetentionPolicy::default(),
            share_path: "/preview/".to_string(),
        }
    }
}

impl PreviewConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PreviewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for token in &self.sandbox {
            let token = token.trim().to_ascii_lowercase();
            if FORBIDDEN_SANDBOX_TOKENS.contains(&token.as_str()) {
                return Err(ConfigError::ForbiddenSandboxToken { token });
            }
        }
        if !self.sandbox.iter().any(|t| t.trim().eq_ignore_ascii_case("allow-scripts")) {
            return Err(ConfigError::MissingSandboxToken {
                token: "allow-scripts".to_string(),
            });
        }
        if self.auto_refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "autoRefreshIntervalMs must be greater than zero".to_string(),
            });
        }
        if !is_identifier(&self.entry_component) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "entryComponent '{}' is not a valid identifier",
                    self.entry_component
                ),
            });
        }
        if self.mount_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "mountId must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Value for the sandbox attribute of the preview frame.
    pub fn sandbox_attribute(&self) -> String {
        self.sandbox
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.auto_refresh_interval_ms)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = PreviewConfig::from_json("{}").unwrap();
        assert_eq!(config, PreviewConfig::default());
        assert_eq!(config.auto_refresh_interval(), Duration::from_millis(3000));
        assert_eq!(
            config.sandbox_attribute(),
            "allow-scripts allow-forms allow-same-origin"
        );
    }

    #[test]
    fn test_partial_override() {
        let config =
            PreviewConfig::from_json(r#"{"entryComponent":"Main","retention":"evict-unreferenced"}"#)
                .unwrap();
        assert_eq!(config.entry_component, "Main");
        assert_eq!(config.retention, RetentionPolicy::EvictUnreferenced);
        assert_eq!(config.mount_id, "app");
    }

    #[test]
    fn test_rejects_top_navigation() {
        let err = PreviewConfig::from_json(
            r#"{"sandbox":["allow-scripts","allow-top-navigation"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ForbiddenSandboxToken { .. }));
    }

    #[test]
    fn test_requires_scripts() {
        let err = PreviewConfig::from_json(r#"{"sandbox":["allow-forms"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSandboxToken { .. }));

        let config = PreviewConfig::from_json(r#"{"sandbox":[" Allow-Scripts ","allow-forms"]}"#);
        assert!(config.is_ok());
        let err = PreviewConfig::from_json(r#"{"sandbox":["allow-scripts","ALLOW-TOP-NAVIGATION"]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ForbiddenSandboxToken { .. }));
    }

    #[test]
    fn test_rejects_bad_entry_component() {
        let err = PreviewConfig::from_json(r#"{"entryComponent":"my-app"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
