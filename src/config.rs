use crate::cli::CliArgs;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_REFRESH_SECS: u64 = 60;
const MIN_REFRESH_SECS: u64 = 5;

/// Effective settings after merging CLI flags, environment, and the
/// optional config file. CLI wins, then BACKEND_ADDR, then the file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub refresh_secs: u64,
    pub token_file: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct BelugaConfigFile {
    #[serde(default)]
    backend_url: Option<String>,
    #[serde(default, alias = "refresh", alias = "refresh_interval_secs")]
    refresh_secs: Option<u64>,
    #[serde(default)]
    token_file: Option<String>,
}

impl Settings {
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let (file, source) = match discover_config_path() {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let parsed = parse_config(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?;
                (parsed, Some(path.display().to_string()))
            }
            None => (BelugaConfigFile::default(), None),
        };

        let backend_url = args
            .backend_url
            .clone()
            .or_else(backend_addr_from_env)
            .or(file.backend_url)
            .context(
                "backend address missing: pass --backend-url, set BACKEND_ADDR, \
                 or add backend_url to the config file",
            )?;

        let refresh_secs = args
            .refresh_secs
            .or(file.refresh_secs)
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(MIN_REFRESH_SECS);

        let token_file = args.token_file.clone().or(file.token_file);

        Ok(Self {
            backend_url: normalize_backend_url(&backend_url),
            refresh_secs,
            token_file,
            source,
        })
    }
}

fn parse_config(raw: &str) -> Result<BelugaConfigFile> {
    Ok(serde_yaml::from_str(raw)?)
}

fn backend_addr_from_env() -> Option<String> {
    std::env::var("BACKEND_ADDR")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Bare host:port addresses get an http scheme, trailing slashes are
/// dropped so endpoint paths concatenate cleanly.
fn normalize_backend_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BELUGA_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("beluga.yaml"),
        PathBuf::from("beluga.yml"),
        PathBuf::from(".beluga.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/beluga/config.yaml"),
            PathBuf::from(&home).join(".config/beluga/config.yml"),
            PathBuf::from(&home).join(".beluga.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{normalize_backend_url, parse_config};

    #[test]
    fn config_file_parses_all_fields() {
        let parsed = parse_config(
            "backend_url: http://backend:8000\nrefresh_secs: 30\ntoken_file: /tmp/auth-token\n",
        )
        .expect("config should parse");
        assert_eq!(parsed.backend_url.as_deref(), Some("http://backend:8000"));
        assert_eq!(parsed.refresh_secs, Some(30));
        assert_eq!(parsed.token_file.as_deref(), Some("/tmp/auth-token"));
    }

    #[test]
    fn config_file_accepts_refresh_alias() {
        let parsed = parse_config("refresh: 15\n").expect("config should parse");
        assert_eq!(parsed.refresh_secs, Some(15));
    }

    #[test]
    fn empty_config_parses_to_defaults() {
        let parsed = parse_config("{}\n").expect("config should parse");
        assert!(parsed.backend_url.is_none());
        assert!(parsed.refresh_secs.is_none());
    }

    #[test]
    fn bare_addresses_get_http_scheme() {
        assert_eq!(
            normalize_backend_url("backend:8000"),
            "http://backend:8000"
        );
        assert_eq!(
            normalize_backend_url("https://backend/"),
            "https://backend"
        );
        assert_eq!(
            normalize_backend_url("http://backend:8000/"),
            "http://backend:8000"
        );
    }
}
