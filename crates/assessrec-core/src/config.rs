//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_ENGINE__MIN_RESULTS=3`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against the directory the config files were read from.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&env::current_dir()?)
    }

    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: base_dir.to_path_buf(), env_name };
        config.validate_for_env()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All typed sections, defaults filled in.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.embedding.validate()?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Resolve a configured path against the config directory.
    pub fn resolve(&self, p: &str) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    fn validate_for_env(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match self.env_name.as_str() {
            "prod" | "production" => {
                if settings.embedding.backend == EmbeddingBackend::Hash {
                    return Err(Error::InvalidConfig(
                        "the hash embedding backend is for tests and development; set embedding.backend = \"bert\"".into(),
                    )
                    .into());
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// JSON array of catalog items.
    pub catalog_path: String,
    /// Directory holding the LanceDB table and its manifest.
    pub index_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            catalog_path: "data/catalog.json".to_string(),
            index_dir: "data/index".to_string(),
            table: "assessments".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Bert,
    Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    /// Directory with `config.json`, `tokenizer.json` and the model weights.
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub hash_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Bert, model_dir: None, max_len: 256, hash_dim: 384 }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be at least 1".into()));
        }
        if self.hash_dim == 0 {
            return Err(Error::InvalidConfig("embedding.hash_dim must be at least 1".into()));
        }
        Ok(())
    }
}

pub const MIN_RESULTS: usize = 5;
pub const MAX_RESULTS: usize = 10;
pub const RETRIEVAL_MULTIPLIER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub min_results: usize,
    pub max_results: usize,
    /// Retrieval pool size is `requested * retrieval_multiplier`.
    pub retrieval_multiplier: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { min_results: MIN_RESULTS, max_results: MAX_RESULTS, retrieval_multiplier: RETRIEVAL_MULTIPLIER }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        if self.min_results == 0 {
            return Err(Error::InvalidConfig("engine.min_results must be at least 1".into()));
        }
        if self.min_results > self.max_results {
            return Err(Error::InvalidConfig(format!(
                "engine.min_results ({}) exceeds engine.max_results ({})",
                self.min_results, self.max_results
            )));
        }
        if self.retrieval_multiplier == 0 {
            return Err(Error::InvalidConfig("engine.retrieval_multiplier must be at least 1".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults_match_constants() {
        let s = EngineSettings::default();
        assert_eq!((s.min_results, s.max_results, s.retrieval_multiplier), (5, 10, 4));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn engine_validation_rejects_inverted_bounds() {
        let s = EngineSettings { min_results: 8, max_results: 3, retrieval_multiplier: 4 };
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
        let s = EngineSettings { retrieval_multiplier: 0, ..EngineSettings::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/assessrec");
        assert_eq!(resolve_with_base(base, "data/catalog.json"), base.join("data/catalog.json"));
        assert_eq!(resolve_with_base(base, "/abs/x.json"), PathBuf::from("/abs/x.json"));
    }
}
