use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{DetectorError, Result};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const EXAMPLE_FILE_NAME: &str = "config.example.json";
pub const PLACEHOLDER_KEY: &str = "sk-your-api-key-here";

pub const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 16_000;
pub const DEFAULT_THINKING_BUDGET: u32 = 10_000;

/// Process-wide settings read once from `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Endpoints in document order; menu indices follow this order.
    #[serde(default, deserialize_with = "deserialize_endpoints")]
    pub apis: Vec<Endpoint>,
    #[serde(default)]
    pub default_api: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub thinking_budget: Option<u32>,
}

/// A named chat endpoint and its bearer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct EndpointEntry {
    #[serde(default)]
    url: String,
    #[serde(default)]
    key: String,
}

fn default_model() -> String {
    DEFAULT_MODEL_ID.to_owned()
}

impl Config {
    /// Read and validate the configuration file at `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(DetectorError::ConfigMissing {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };

        let config = Self::parse(&raw, path)?;
        tracing::debug!(
            "loaded {} endpoint(s) from {}",
            config.apis.len(),
            path.display()
        );
        Ok(config)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, DetectorError> {
        let config: Config =
            serde_json::from_str(raw).map_err(|source| DetectorError::ConfigMalformed {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DetectorError> {
        if self.apis.is_empty() {
            return Err(DetectorError::NoEndpoints);
        }
        if let Some(name) = &self.default_api {
            if self.endpoint(name).is_none() {
                return Err(DetectorError::UnknownDefault(name.clone()));
            }
        }
        Ok(())
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.apis.iter().find(|endpoint| endpoint.name == name)
    }

    /// Zero-based index of the default endpoint (first entry when unset).
    pub fn default_index(&self) -> usize {
        self.default_api
            .as_deref()
            .and_then(|name| self.apis.iter().position(|endpoint| endpoint.name == name))
            .unwrap_or(0)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn thinking_budget(&self) -> u32 {
        self.thinking_budget.unwrap_or(DEFAULT_THINKING_BUDGET)
    }
}

impl Endpoint {
    /// A key is usable once it is filled in and no longer the template placeholder.
    pub fn has_usable_key(&self) -> bool {
        let key = self.key.trim();
        !key.is_empty() && key != PLACEHOLDER_KEY
    }
}

/// `config.json` beside the executable, else the one in the working directory.
pub fn default_path() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
    match beside_exe {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(CONFIG_FILE_NAME),
    }
}

fn deserialize_endpoints<'de, D>(deserializer: D) -> std::result::Result<Vec<Endpoint>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EndpointsVisitor;

    impl<'de> Visitor<'de> for EndpointsVisitor {
        type Value = Vec<Endpoint>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of API name to {\"url\", \"key\"}")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut endpoints = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, entry)) = map.next_entry::<String, EndpointEntry>()? {
                endpoints.push(Endpoint {
                    name,
                    url: entry.url,
                    key: entry.key,
                });
            }
            Ok(endpoints)
        }
    }

    deserializer.deserialize_map(EndpointsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;

    const SAMPLE: &str = r#"{
        "apis": {
            "zeta": { "url": "https://zeta.example/v1/messages", "key": "sk-zeta" },
            "alpha": { "url": "https://alpha.example/v1/messages", "key": "sk-your-api-key-here" },
            "mid": { "url": "https://mid.example/v1/messages" }
        },
        "default_api": "alpha",
        "max_tokens": 2048
    }"#;

    fn parse(raw: &str) -> Result<Config, DetectorError> {
        Config::parse(raw, Path::new("config.json"))
    }

    #[test]
    fn keeps_document_order_of_apis() {
        let config = parse(SAMPLE).unwrap();
        let names: Vec<&str> = config.apis.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(config.default_index(), 1);
    }

    #[test]
    fn falls_back_to_generation_defaults() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL_ID);
        assert_eq!(config.max_tokens(), 2048);
        assert_eq!(config.thinking_budget(), DEFAULT_THINKING_BUDGET);
    }

    #[test]
    fn default_index_is_first_when_unset() {
        let config = parse(r#"{"apis": {"a": {"url": "u", "key": "k"}}}"#).unwrap();
        assert_eq!(config.default_index(), 0);
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn rejects_malformed_json() {
        assert_matches!(parse("{ not json"), Err(DetectorError::ConfigMalformed { .. }));
    }

    #[test]
    fn rejects_empty_and_unknown_default() {
        assert_matches!(parse(r#"{"apis": {}}"#), Err(DetectorError::NoEndpoints));
        assert_matches!(parse("{}"), Err(DetectorError::NoEndpoints));
        assert_matches!(
            parse(r#"{"apis": {"a": {"url": "u", "key": "k"}}, "default_api": "b"}"#),
            Err(DetectorError::UnknownDefault(name)) if name == "b"
        );
    }

    #[test]
    fn placeholder_and_blank_keys_are_unusable() {
        let config = parse(SAMPLE).unwrap();
        assert!(config.apis[0].has_usable_key());
        assert!(!config.apis[1].has_usable_key());
        assert!(!config.apis[2].has_usable_key());
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let err = Config::load(&path).await.unwrap_err();
        assert_matches!(
            err.downcast_ref::<DetectorError>(),
            Some(DetectorError::ConfigMissing { .. })
        );
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, SAMPLE).unwrap();
        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.endpoint("mid").map(|e| e.key.as_str()), Some(""));
    }
}
