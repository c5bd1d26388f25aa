//! Configuration management for the assistant backend.
//!
//! This module handles loading and merging configuration from multiple sources,
//! in increasing order of precedence:
//! - Built-in defaults
//! - A YAML config file (`ASSIST_CONFIG` or `--config`)
//! - Environment variables
//! - Command-line flags
//!
//! Configuration is read once at startup; there is no hot reload.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Config file the values were loaded from (if any)
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Logging options
    pub logging: LoggingConfig,

    /// HTTP server options
    pub server: ServerConfig,

    /// Document store options
    pub store: StoreConfig,

    /// Query encoder options
    pub embedding: EmbeddingSettings,

    /// Generation model options
    pub chat: ChatSettings,

    /// Sampling parameters passed to the generation model
    pub sampling: SamplingConfig,

    /// Retrieval and selection limits
    pub retrieval: RetrievalConfig,

    /// Prompt template selection
    pub prompt: PromptSettings,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {}. Supported: text, json", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "assist_knowledge=debug")
    pub level: Option<String>,

    pub format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (host:port)
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend name: "clickhouse" or "memory"
    pub backend: String,

    /// JSONL file with documents and embeddings (memory backend only)
    pub documents_path: Option<PathBuf>,

    pub clickhouse: ClickHouseConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "clickhouse".to_string(),
            documents_path: None,
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

/// ClickHouse HTTP interface connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickHouseConfig {
    pub host: String,
    pub port: u16,
    /// Table holding documents and their embeddings
    pub table: String,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Use https instead of http
    pub secure: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8123,
            table: String::new(),
            database: None,
            user: None,
            password: None,
            secure: false,
            timeout_secs: 30,
        }
    }
}

impl ClickHouseConfig {
    /// Base URL of the HTTP interface.
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}/", scheme, self.host, self.port)
    }
}

/// Query encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name: "onnx" or "hashing"
    pub provider: String,

    /// Model identifier; for "onnx" a directory with `model.onnx` and `tokenizer.json`
    pub model: String,

    /// Token budget per input; longer inputs are truncated
    pub max_length: usize,

    /// Expected vector dimensionality (checked against the model when set)
    pub dimensions: Option<usize>,

    /// L2-normalize output vectors
    pub normalize: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "onnx".to_string(),
            model: String::new(),
            max_length: 512,
            dimensions: None,
            normalize: false,
        }
    }
}

/// Generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Provider name: "ollama" or "mock"
    pub provider: String,

    /// Model identifier understood by the provider
    pub model: String,

    /// Provider endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// How long the provider keeps the model loaded between requests (e.g. "30m")
    pub keep_alive: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: String::new(),
            endpoint: "http://localhost:11434".to_string(),
            timeout_secs: 300,
            keep_alive: None,
        }
    }
}

/// Sampling parameters for the generation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Upper bound on generated tokens
    pub max_new_tokens: u32,

    /// Sampling softness (0 = deterministic-leaning)
    pub temperature: f32,

    /// Restrict sampling to the K most probable tokens
    pub top_k: u32,

    /// Nucleus sampling cutoff
    pub top_p: f32,

    /// Multiplicative penalty for repeated tokens
    pub repetition_penalty: f32,

    /// Stochastic sampling (false = greedy/beam decoding)
    pub do_sample: bool,

    /// Beam width when not purely sampling
    pub num_beams: u32,

    /// Stop beam search once enough complete candidates exist
    pub early_stopping: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 8000,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            repetition_penalty: 2.0,
            do_sample: true,
            num_beams: 2,
            early_stopping: true,
        }
    }
}

impl SamplingConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_new_tokens == 0 {
            return Err(AppError::Config(
                "sampling.max_new_tokens must be greater than 0".to_string(),
            ));
        }

        if !(self.temperature >= 0.0) {
            return Err(AppError::Config(format!(
                "sampling.temperature must be >= 0, got {}",
                self.temperature
            )));
        }

        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(AppError::Config(format!(
                "sampling.top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }

        if !(self.repetition_penalty > 0.0) {
            return Err(AppError::Config(format!(
                "sampling.repetition_penalty must be > 0, got {}",
                self.repetition_penalty
            )));
        }

        if self.num_beams == 0 {
            return Err(AppError::Config(
                "sampling.num_beams must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Retrieval, selection and inference limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of documents kept after filtering
    pub limit: usize,

    /// Extra rows fetched from storage to survive filtering
    pub oversample: usize,

    /// Documents with a description of at most this many characters are dropped
    pub min_description_chars: usize,

    /// Number of documents placed into the prompt context
    pub include_limit: usize,

    /// Generation calls allowed to run at the same time
    pub max_concurrent_generations: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            oversample: 500,
            min_description_chars: 100,
            include_limit: 3,
            max_concurrent_generations: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory with `<id>.yml` prompt definitions; built-in prompt when unset
    pub dir: Option<PathBuf>,

    /// Prompt definition to use
    pub id: String,

    /// Overrides the definition's response language
    pub language: Option<String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            dir: None,
            id: "assist.default".to_string(),
            language: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
            sampling: SamplingConfig::default(),
            retrieval: RetrievalConfig::default(),
            prompt: PromptSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the YAML file, environment variables and defaults.
    ///
    /// The config file is `config_file` when given, otherwise `ASSIST_CONFIG`.
    ///
    /// Environment variables:
    /// - `ASSIST_CONFIG`, `ASSIST_BIND`, `ASSIST_LOG_FORMAT`, `RUST_LOG`, `NO_COLOR`
    /// - `ASSIST_STORE_BACKEND`, `ASSIST_DOCUMENTS_PATH`
    /// - `CLICKHOUSE_HOST`, `CLICKHOUSE_PORT`, `CLICKHOUSE_TABLE`,
    ///   `CLICKHOUSE_DATABASE`, `CLICKHOUSE_USER`, `CLICKHOUSE_PASSWORD`
    /// - `ASSIST_EMBEDDING_PROVIDER`, `EMBEDDING_MODEL`
    /// - `ASSIST_CHAT_PROVIDER`, `CHATBOT_MODEL`, `OLLAMA_URL`
    /// - `ASSIST_PROMPT_DIR`, `ASSIST_PROMPT_ID`, `ASSIST_RESPONSE_LANGUAGE`
    ///
    /// # Example
    /// ```no_run
    /// use assist_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Table: {}", config.store.clickhouse.table);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with a custom environment lookup.
    pub fn load_with<F>(config_file: Option<&Path>, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = config_file
            .map(Path::to_path_buf)
            .or_else(|| env("ASSIST_CONFIG").map(PathBuf::from));

        let mut config = match config_path {
            Some(ref path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.config_file = config_path;

        // Environment variables override YAML config
        config.apply_env(&env)?;

        Ok(config)
    }

    /// Parse a YAML config file. Missing sections keep their defaults.
    fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    fn apply_env<F>(&mut self, env: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = env("ASSIST_BIND") {
            self.server.bind = bind;
        }

        if let Some(level) = env("RUST_LOG") {
            self.logging.level = Some(level);
        }

        if let Some(format) = env("ASSIST_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(AppError::Config)?;
        }

        if env("NO_COLOR").is_some() {
            self.logging.no_color = true;
        }

        if let Some(backend) = env("ASSIST_STORE_BACKEND") {
            self.store.backend = backend;
        }

        if let Some(path) = env("ASSIST_DOCUMENTS_PATH") {
            self.store.documents_path = Some(PathBuf::from(path));
        }

        let clickhouse = &mut self.store.clickhouse;
        if let Some(host) = env("CLICKHOUSE_HOST") {
            clickhouse.host = host;
        }

        if let Some(port) = env("CLICKHOUSE_PORT") {
            clickhouse.port = port.trim().parse().map_err(|e| {
                AppError::Config(format!("Invalid CLICKHOUSE_PORT '{}': {}", port, e))
            })?;
        }

        if let Some(table) = env("CLICKHOUSE_TABLE") {
            clickhouse.table = table;
        }

        if let Some(database) = env("CLICKHOUSE_DATABASE") {
            clickhouse.database = Some(database);
        }

        if let Some(user) = env("CLICKHOUSE_USER") {
            clickhouse.user = Some(user);
        }

        if let Some(password) = env("CLICKHOUSE_PASSWORD") {
            clickhouse.password = Some(password);
        }

        if let Some(provider) = env("ASSIST_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Some(model) = env("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Some(provider) = env("ASSIST_CHAT_PROVIDER") {
            self.chat.provider = provider;
        }

        if let Some(model) = env("CHATBOT_MODEL") {
            self.chat.model = model;
        }

        if let Some(endpoint) = env("OLLAMA_URL") {
            self.chat.endpoint = endpoint;
        }

        if let Some(dir) = env("ASSIST_PROMPT_DIR") {
            self.prompt.dir = Some(PathBuf::from(dir));
        }

        if let Some(id) = env("ASSIST_PROMPT_ID") {
            self.prompt.id = id;
        }

        if let Some(language) = env("ASSIST_RESPONSE_LANGUAGE") {
            self.prompt.language = Some(language);
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        bind: Option<String>,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        if let Some(log_level) = log_level {
            self.logging.level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.logging.format = log_format;
        }

        if verbose {
            self.logging.verbose = true;
            // Verbose mode implies debug logging
            if self.logging.level.is_none() {
                self.logging.level = Some("debug".to_string());
            }
        }

        if no_color {
            self.logging.no_color = true;
        }

        self
    }

    /// Validate that everything needed to start the pipeline is present.
    pub fn validate(&self) -> AppResult<()> {
        match self.store.backend.as_str() {
            "clickhouse" => {
                let clickhouse = &self.store.clickhouse;
                if clickhouse.host.trim().is_empty() {
                    return Err(AppError::Config(
                        "ClickHouse host is not set (CLICKHOUSE_HOST)".to_string(),
                    ));
                }
                if clickhouse.table.trim().is_empty() {
                    return Err(AppError::Config(
                        "ClickHouse table is not set (CLICKHOUSE_TABLE)".to_string(),
                    ));
                }
                if clickhouse.port == 0 {
                    return Err(AppError::Config("ClickHouse port must not be 0".to_string()));
                }
            }
            "memory" => {
                if self.store.documents_path.is_none() {
                    return Err(AppError::Config(
                        "Memory store requires a documents file (ASSIST_DOCUMENTS_PATH)"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(AppError::Config(format!(
                    "Unknown store backend: {}. Supported: clickhouse, memory",
                    other
                )));
            }
        }

        match self.embedding.provider.as_str() {
            "onnx" => {
                if self.embedding.model.trim().is_empty() {
                    return Err(AppError::Config(
                        "Embedding model is not set (EMBEDDING_MODEL)".to_string(),
                    ));
                }
            }
            "hashing" => {}
            other => {
                return Err(AppError::Config(format!(
                    "Unknown embedding provider: {}. Supported: onnx, hashing",
                    other
                )));
            }
        }

        if self.embedding.max_length == 0 {
            return Err(AppError::Config(
                "embedding.max_length must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dimensions == Some(0) {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        match self.chat.provider.as_str() {
            "ollama" => {
                if self.chat.model.trim().is_empty() {
                    return Err(AppError::Config(
                        "Chat model is not set (CHATBOT_MODEL)".to_string(),
                    ));
                }
            }
            "mock" => {}
            other => {
                return Err(AppError::Config(format!(
                    "Unknown chat provider: {}. Supported: ollama, mock",
                    other
                )));
            }
        }

        if self.retrieval.limit == 0 {
            return Err(AppError::Config(
                "retrieval.limit must be at least 1".to_string(),
            ));
        }

        if self.retrieval.include_limit == 0 {
            return Err(AppError::Config(
                "retrieval.include_limit must be at least 1".to_string(),
            ));
        }

        if self.retrieval.max_concurrent_generations == 0 {
            return Err(AppError::Config(
                "retrieval.max_concurrent_generations must be at least 1".to_string(),
            ));
        }

        self.sampling.validate()
    }
}
