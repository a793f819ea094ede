use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

/// Connection settings handed to [`crate::RemoteClient`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute address for an API path such as `/api/opportunities`.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
}

/// Resolves the client configuration: defaults, then the TOML file (if it
/// exists), then `API_BASE_URL` / `APP__API_BASE_URL`.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    load_config_with(path, |key| std::env::var(key).ok())
}

fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let mut raw_base_url = None;

    if let Ok(raw) = fs::read_to_string(path) {
        raw_base_url = base_url_from_toml(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    }

    if let Some(v) = env_base_url(lookup) {
        raw_base_url = Some(v);
    }

    match raw_base_url {
        Some(v) => ClientConfig::new(&v),
        None => Ok(ClientConfig::default()),
    }
}

fn base_url_from_toml(raw: &str) -> anyhow::Result<Option<String>> {
    let file_cfg: FileConfig = toml::from_str(raw)?;
    Ok(file_cfg.api_base_url)
}

fn env_base_url(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    set("APP__API_BASE_URL").or_else(|| set("API_BASE_URL"))
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("api base url must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
