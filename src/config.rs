use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Application configuration, loaded from `pyconsole.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON RPC endpoint of the execution service.
    pub server_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Bounded retries for transient HTTP failures (network, 429, 5xx).
    pub max_retries: u32,
    /// Directory for the per-session log file.
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4000/json".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            log_dir: "logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./pyconsole.toml` ->
    /// `~/pyconsole.toml` -> defaults. A `PYCONSOLE_URL` environment
    /// variable overrides the configured server URL.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        if let Ok(url) = std::env::var("PYCONSOLE_URL") {
            if !url.is_empty() {
                config.server_url = url;
            }
        }
        config
    }

    fn load_file() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pyconsole.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("pyconsole.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:4000/json");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.log_dir, "logs");
    }

    #[test]
    fn test_partial_toml_deserialize() {
        let toml_str = r#"
            server_url = "http://console.example.org/json"
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server_url, "http://console.example.org/json");
        // Other fields should be defaults
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn test_full_toml_deserialize() {
        let toml_str = r#"
            server_url = "http://instrument:4000/json"
            request_timeout_secs = 10
            max_retries = 5
            log_dir = "console_logs"
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server_url, "http://instrument:4000/json");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.log_dir, "console_logs");
    }

    #[test]
    fn test_env_var_overrides_url() {
        std::env::set_var("PYCONSOLE_URL", "http://override:9000/json");
        let cfg = AppConfig::load();
        assert_eq!(cfg.server_url, "http://override:9000/json");
        std::env::remove_var("PYCONSOLE_URL");
    }
}
