//! Configuration: TOML file plus environment overlay.
//!
//! The file is optional; every section has defaults. After the file is parsed,
//! non-empty environment variables override it (see [`Config::apply_env`]),
//! then [`Config::validate`] rejects anything that cannot work. All of this
//! happens before any network call.
//!
//! ```toml
//! [owner]
//! name = "Dana Example"
//! github_username = "dana"
//! linkedin_url = "https://linkedin.com/in/dana"
//!
//! [corpus]
//! topic = "portfolio"
//! clone_dir = "./project_repos"
//!
//! [retrieval]
//! top_k = 2
//!
//! [embedding]
//! provider = "local"
//!
//! [model]
//! provider = "gemini"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./config/folio.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub owner: OwnerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OwnerConfig {
    #[serde(default = "default_owner_name")]
    pub name: String,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub scheduling_url: Option<String>,
    #[serde(default = "default_profile_pic_url")]
    pub profile_pic_url: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            name: default_owner_name(),
            github_username: None,
            linkedin_url: None,
            resume_url: None,
            scheduling_url: None,
            profile_pic_url: default_profile_pic_url(),
        }
    }
}

fn default_owner_name() -> String {
    "the portfolio owner".to_string()
}
fn default_profile_pic_url() -> String {
    "https://placehold.co/400x400/0D1117/FFFFFF?text=DM".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,
    /// File read from each repository.
    #[serde(default = "default_document_file")]
    pub document_file: String,
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// From `GITHUB_TOKEN`; never read from the file.
    #[serde(skip)]
    pub github_token: Option<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            clone_dir: default_clone_dir(),
            document_file: default_document_file(),
            github_api_url: default_github_api_url(),
            timeout_secs: default_timeout_secs(),
            github_token: None,
        }
    }
}

fn default_topic() -> String {
    "portfolio".to_string()
}
fn default_clone_dir() -> PathBuf {
    PathBuf::from("./project_repos")
}
fn default_document_file() -> String {
    "README.md".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> usize {
    700
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the `ollama` provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_provider")]
    pub provider: String,
    /// Model id; defaults per provider.
    #[serde(default)]
    pub model: Option<String>,
    /// Chat-completions base URL; defaults per provider.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key; defaults per provider.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_model_retries")]
    pub max_retries: u32,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
    /// Resolved from the environment; never read from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            model: None,
            base_url: None,
            api_key_env: None,
            temperature: 0.0,
            max_iterations: default_max_iterations(),
            max_retries: default_model_retries(),
            timeout_secs: default_model_timeout_secs(),
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Environment variable the API key is read from, if the provider needs one.
    pub fn api_key_var(&self) -> Option<&str> {
        if let Some(var) = &self.api_key_env {
            return Some(var.as_str());
        }
        match self.provider.as_str() {
            "gemini" => Some("GOOGLE_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    pub fn model_name(&self) -> &str {
        if let Some(model) = &self.model {
            return model;
        }
        match self.provider.as_str() {
            "openai" => "gpt-4o-mini",
            "ollama" => "llama3.1",
            _ => "gemini-2.0-flash",
        }
    }

    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/');
        }
        match self.provider.as_str() {
            "openai" => "https://api.openai.com/v1",
            "ollama" => "http://localhost:11434/v1",
            _ => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

fn default_model_provider() -> String {
    "gemini".to_string()
}
fn default_max_iterations() -> usize {
    8
}
fn default_model_retries() -> u32 {
    3
}
fn default_model_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}

impl Config {
    /// Override file values with non-empty variables returned by `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GITHUB_USERNAME` | `owner.github_username` |
    /// | `MY_NAME` | `owner.name` |
    /// | `MY_LINKEDIN_URL` | `owner.linkedin_url` |
    /// | `MY_RESUME_URL` | `owner.resume_url` |
    /// | `MY_CALENDLY_LINK` | `owner.scheduling_url` |
    /// | `MY_PROFILE_PIC_URL` | `owner.profile_pic_url` |
    /// | `PORTFOLIO_TOPIC` | `corpus.topic` |
    /// | `GITHUB_TOKEN` | `corpus.github_token` |
    /// | [`ModelConfig::api_key_var`] | `model.api_key` |
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GITHUB_USERNAME") {
            self.owner.github_username = Some(v);
        }
        if let Some(v) = get("MY_NAME") {
            self.owner.name = v;
        }
        if let Some(v) = get("MY_LINKEDIN_URL") {
            self.owner.linkedin_url = Some(v);
        }
        if let Some(v) = get("MY_RESUME_URL") {
            self.owner.resume_url = Some(v);
        }
        if let Some(v) = get("MY_CALENDLY_LINK") {
            self.owner.scheduling_url = Some(v);
        }
        if let Some(v) = get("MY_PROFILE_PIC_URL") {
            self.owner.profile_pic_url = v;
        }
        if let Some(v) = get("PORTFOLIO_TOPIC") {
            self.corpus.topic = v;
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.corpus.github_token = Some(v);
        }
        if let Some(var) = self.model.api_key_var().map(str::to_string) {
            if let Some(v) = get(&var) {
                self.model.api_key = Some(v);
            }
        }
    }

    /// Checks needed to load and index the corpus.
    pub fn validate_corpus(&self) -> Result<()> {
        let username = self.owner.github_username.as_deref().unwrap_or("").trim();
        if username.is_empty() {
            bail!("owner.github_username is required (set GITHUB_USERNAME or [owner] github_username)");
        }
        if self.corpus.topic.trim().is_empty() {
            bail!("corpus.topic must not be empty");
        }
        if self.corpus.document_file.trim().is_empty() {
            bail!("corpus.document_file must not be empty");
        }

        if self.chunking.max_tokens == 0 {
            bail!("chunking.max_tokens must be > 0");
        }
        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "local" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
                other
            ),
        }
        if self.embedding.is_enabled() && self.embedding.dims == Some(0) {
            bail!("embedding.dims must be > 0");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        Ok(())
    }

    /// Every check, including the reasoning model and its credential.
    pub fn validate(&self) -> Result<()> {
        self.validate_corpus()?;

        match self.model.provider.as_str() {
            "gemini" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown model provider: '{}'. Must be gemini, openai, or ollama.",
                other
            ),
        }
        if self.model.max_iterations < 1 {
            bail!("model.max_iterations must be >= 1");
        }
        if let Some(var) = self.model.api_key_var() {
            if self.model.api_key.is_none() {
                bail!(
                    "{} not set (required by model provider '{}')",
                    var,
                    self.model.provider
                );
            }
        }

        Ok(())
    }
}

/// Parse TOML text without consulting the environment.
pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).with_context(|| "Failed to parse config file")
}

/// Read `path` (absent file means defaults) and overlay the process
/// environment. Callers validate what their command needs.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
