use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const ENDPOINT_ENV: &str = "JAEN_POPUP_ENDPOINT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub copy_feedback_ms: u64,
    pub popup_offset_y: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 15,
            copy_feedback_ms: 1000,
            popup_offset_y: 10.0,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    /// Loads `config.json` next to the executable. A missing file yields the
    /// defaults and is not created; a broken one yields the defaults and a
    /// warning.
    pub fn load() -> Self {
        let path = Self::path();
        let mut cfg = match Self::load_from(&path) {
            Ok(Some(cfg)) => cfg,
            Ok(None) => Self::default(),
            Err(err) => {
                tracing::warn!(%err, "failed to load config; using defaults");
                Self::default()
            }
        };
        if let Ok(v) = std::env::var(ENDPOINT_ENV) {
            cfg.apply_endpoint_override(&v);
        }
        cfg
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str::<Config>(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    fn apply_endpoint_override(&mut self, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.endpoint = value.to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("jaen-popup-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path);
        assert!(Config::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults_per_field() {
        let path = temp_path("partial");
        fs::write(&path, r#"{ "copy_feedback_ms": 250 }"#).unwrap();
        let cfg = Config::load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.copy_feedback(), Duration::from_millis(250));
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.popup_offset_y, 10.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let path = temp_path("malformed");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn full_file_overrides_every_field() {
        let path = temp_path("full");
        fs::write(
            &path,
            r#"{
                "endpoint": "http://127.0.0.1:9/t",
                "request_timeout_secs": 3,
                "copy_feedback_ms": 1500,
                "popup_offset_y": 4.0
            }"#,
        )
        .unwrap();
        let expected = Config {
            endpoint: "http://127.0.0.1:9/t".to_string(),
            request_timeout_secs: 3,
            copy_feedback_ms: 1500,
            popup_offset_y: 4.0,
        };
        assert_eq!(Config::load_from(&path).unwrap(), Some(expected));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_without_file_leaves_exe_dir_untouched() {
        let path = Config::path();
        if path.exists() {
            return;
        }
        let cfg = Config::load();
        assert_eq!(cfg.copy_feedback_ms, Config::default().copy_feedback_ms);
        assert!(!path.exists());
    }

    #[test]
    fn blank_endpoint_override_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_endpoint_override("   ");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        cfg.apply_endpoint_override(" http://localhost:8080/single ");
        assert_eq!(cfg.endpoint, "http://localhost:8080/single");
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
