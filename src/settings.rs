use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Default location of the settings file, resolvable once per process.
/// `PORTAL_SHELL_SETTINGS` overrides it for side-by-side installs.
pub static SETTINGS_PATH: Lazy<String> = Lazy::new(|| {
    std::env::var("PORTAL_SHELL_SETTINGS").unwrap_or_else(|_| "settings.json".to_string())
});

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the backend API. Ignored when `use_mock_api` is set.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Static bearer token sent with every request, if any.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Serve canned data in-process instead of talking to a backend.
    /// Defaults to `true` so the shell runs out of the box.
    #[serde(default = "default_use_mock_api")]
    pub use_mock_api: bool,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Freshness window of dashboard data, in seconds.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Freshness window of profile, navigation and page configs. These
    /// change rarely, so the window is much wider.
    #[serde(default = "default_config_stale_after_secs")]
    pub config_stale_after_secs: u64,
    /// Retries after a failed fetch before the error is surfaced.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Last known window size. If absent, a default size is used.
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_use_mock_api() -> bool {
    true
}

fn default_stale_after_secs() -> u64 {
    30
}

fn default_config_stale_after_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            use_mock_api: default_use_mock_api(),
            debug_logging: false,
            stale_after_secs: default_stale_after_secs(),
            config_stale_after_secs: default_config_stale_after_secs(),
            max_retries: default_max_retries(),
            window_size: Some((1280.0, 800.0)),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert!(settings.use_mock_api);
        assert_eq!(settings.max_retries, 2);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"use_mock_api": false, "api_token": "t"}"#).unwrap();
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert!(!settings.use_mock_api);
        assert_eq!(settings.api_token.as_deref(), Some("t"));
        assert_eq!(settings.stale_after_secs, 30);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.api_base_url = "https://portal.example.com/api".into();
        settings.window_size = Some((1024.0, 768.0));
        settings.save(path.to_str().unwrap()).unwrap();
        let loaded = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.api_base_url, settings.api_base_url);
        assert_eq!(loaded.window_size, settings.window_size);
    }
}
