//! Configuration loading from `~/.uastack/config.toml` with defaults.

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uastack_types::config::ApplicationConfig;

/// Load the application configuration from a TOML file.
///
/// A missing file, or one that cannot be read or parsed, yields the default
/// configuration; the reason is logged.
pub fn load_config(path: Option<&Path>) -> ApplicationConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return ApplicationConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<ApplicationConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                ApplicationConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            ApplicationConfig::default()
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    uastack_home().join("config.toml")
}

/// Get the default uastack home directory.
pub fn uastack_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".uastack")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uastack_types::security::{EngineFlag, MessageSecurityMode, SecurityPolicy};

    #[test]
    fn test_load_config_missing_file() {
        let config = load_config(Some(Path::new("/nonexistent/uastack.toml")));
        assert_eq!(config, ApplicationConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
application_uri = "urn:plant:line1"
application_name = "Line 1"
locales = ["en-US", "de"]

[tcp]
listen_addr = "127.0.0.1:4841"
flags = ["multi_thread"]
user_token_policies = ["anonymous", "username_basic256"]

[[tcp.security]]
mode = "None"
policy = "None"

[[tcp.security]]
mode = "SignAndEncrypt"
policy = "Basic256Sha256"

[limits]
max_array_length = 100
"#,
        )
        .unwrap();

        let config = load_config(Some(&path));
        assert_eq!(config.application_uri.as_deref(), Some("urn:plant:line1"));
        assert_eq!(config.locales, vec!["en-US", "de"]);
        assert!(config.tcp.flags.contains(&EngineFlag::MultiThread));
        assert_eq!(config.tcp.security.len(), 2);
        assert_eq!(config.tcp.security[1].mode, MessageSecurityMode::SignAndEncrypt);
        assert_eq!(config.tcp.security[1].policy, SecurityPolicy::Basic256Sha256);
        assert_eq!(config.limits.max_array_length, 100);
        assert_eq!(config.limits.max_string_length, 65_535);
        assert_eq!(config.https, Default::default());
    }

    #[test]
    fn test_load_config_invalid_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "application_name = [").unwrap();
        assert_eq!(load_config(Some(&path)), ApplicationConfig::default());
    }
}
