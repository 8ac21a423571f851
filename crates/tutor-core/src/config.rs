//! Configuration loader, typed settings, and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys split on `__`). Every settings section has defaults so an
//! empty configuration still yields a usable `Settings`.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Neighbours fetched for every question.
pub const DEFAULT_TOP_K: usize = 6;
/// Best inner-product score below which a question is out of scope.
pub const DEFAULT_MIN_SCORE: f32 = 0.15;
/// Chunks drawn per quiz item.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const DEFAULT_MIN_QUESTIONS: usize = 1;
pub const DEFAULT_MAX_QUESTIONS: usize = 10;
/// Prior chat turns forwarded with a question.
pub const DEFAULT_HISTORY_LIMIT: usize = 6;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        tracing::debug!(env = %env_name, "configuration sources merged");
        Ok(Self { figment })
    }

    /// Build from an explicit figment, e.g. an inline TOML string in tests.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub quiz: QuizSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Err(crate::Error::InvalidConfig(msg.to_string()));
        if self.retrieval.top_k == 0 {
            return invalid("retrieval.top_k must be at least 1");
        }
        if !(-1.0..=1.0).contains(&self.retrieval.min_score) {
            return invalid("retrieval.min_score must lie in [-1, 1]");
        }
        if self.quiz.sample_size == 0 {
            return invalid("quiz.sample_size must be at least 1");
        }
        if self.quiz.min_questions == 0 || self.quiz.min_questions > self.quiz.max_questions {
            return invalid("quiz question bounds must satisfy 1 <= min_questions <= max_questions");
        }
        if self.embedding.max_len == 0 {
            return invalid("embedding.max_len must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub artifacts_dir: String,
    pub table_name: String,
    pub topics_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            raw_txt_dir: "data/txt".to_string(),
            artifacts_dir: "data/artifacts".to_string(),
            table_name: "chunks".to_string(),
            topics_path: "data/topics.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 128, use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K, min_score: DEFAULT_MIN_SCORE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub sample_size: usize,
    pub min_questions: usize,
    pub max_questions: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            min_questions: DEFAULT_MIN_QUESTIONS,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub api_base: String,
    pub api_key_env: String,
    pub model: String,
    pub history_limit: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
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
