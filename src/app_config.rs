use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::language_utils::{language_codes_match, language_display_name};
use crate::translation::chunker::DEFAULT_MAX_CHUNK_SIZE;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Books to process, in order
    #[serde(default)]
    pub books: Vec<BookConfig>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// What to do with a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookAction {
    // @action: Translate chapters and write the output container
    Translate,
    // @action: Print a short digest of every chapter
    ShowChapters,
    // @action: Report images no chapter refers to
    CheckError,
}

impl BookAction {
    // @returns: Identifier used in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::ShowChapters => "show_chapters",
            Self::CheckError => "check_error",
        }
    }
}

impl std::fmt::Display for BookAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "translate" => Ok(Self::Translate),
            "show_chapters" => Ok(Self::ShowChapters),
            "check_error" => Ok(Self::CheckError),
            _ => Err(anyhow!("Unknown action: {}", s)),
        }
    }
}

/// Per-book settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookConfig {
    // @field: Whether the book runs when no subcommand is given
    #[serde(default)]
    pub run: bool,

    // @field: translate | show_chapters | check_error
    #[serde(default = "default_action")]
    pub action: String,

    // @field: Source EPUB path
    pub input: String,

    // @field: Output EPUB path, derived from the input when empty
    #[serde(default = "String::new")]
    pub output: String,

    // @field: Resume from the checkpoint record
    #[serde(default, rename = "continue")]
    pub resume: bool,

    // @field: Keep only this many chunks per chapter, 0 for all
    #[serde(default)]
    pub test: usize,

    // @field: First chapter to translate (1-based, inclusive)
    #[serde(default)]
    pub from_chapter: Option<usize>,

    // @field: Last chapter to translate (1-based, inclusive)
    #[serde(default)]
    pub to_chapter: Option<usize>,

    // @field: Source language, ISO code or name
    pub from_lang: String,

    // @field: Target language, ISO code or name
    pub to_lang: String,

    // @field: Custom system instruction lines
    #[serde(default)]
    pub promote: Option<Vec<String>>,
}

/// Inclusive 1-based chapter range with optional bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChapterRange {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl ChapterRange {
    pub fn new(from: Option<usize>, to: Option<usize>) -> Self {
        Self { from, to }
    }

    /// Whether a 1-based chapter number falls inside the range
    pub fn contains(&self, chapter: usize) -> bool {
        self.from.is_none_or(|from| chapter >= from) && self.to.is_none_or(|to| chapter <= to)
    }
}

impl BookConfig {
    /// Create a translate book with default settings
    pub fn new(input: impl Into<String>, from_lang: impl Into<String>, to_lang: impl Into<String>) -> Self {
        Self {
            run: true,
            action: default_action(),
            input: input.into(),
            output: String::new(),
            resume: false,
            test: 0,
            from_chapter: None,
            to_chapter: None,
            from_lang: from_lang.into(),
            to_lang: to_lang.into(),
            promote: None,
        }
    }

    /// Parsed action
    pub fn action(&self) -> Result<BookAction> {
        self.action.parse()
    }

    pub fn chapter_range(&self) -> ChapterRange {
        ChapterRange::new(self.from_chapter, self.to_chapter)
    }

    /// Input file stem, used to key checkpoint files
    pub fn input_stem(&self) -> String {
        Path::new(&self.input)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string())
    }

    /// Output path, `<stem>.<to>.epub` next to the input when not configured
    pub fn output_path(&self) -> PathBuf {
        if !self.output.trim().is_empty() {
            return PathBuf::from(&self.output);
        }
        let input = Path::new(&self.input);
        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        FileManager::translated_book_path(input, dir, &self.to_lang.to_lowercase(), "epub")
    }

    /// System instruction sent with every chunk.
    ///
    /// Custom `promote` lines are joined with newlines; without them a default
    /// three-line instruction is built from the language pair.
    pub fn system_prompt(&self) -> String {
        match &self.promote {
            Some(lines) if !lines.is_empty() => lines.join("\n"),
            _ => {
                let from = language_display_name(&self.from_lang);
                let to = language_display_name(&self.to_lang);
                [
                    format!("1. You are an {}-to-{} translator. ", from, to),
                    "2. Keep all special characters and HTML tags as in the source text. ".to_string(),
                    format!("3. Return only {} translation. Don't add extra HTML tag!!!", to),
                ]
                .join("\n")
            }
        }
    }

    /// Check a single book's fields
    pub fn validate(&self) -> Result<()> {
        self.action()?;

        if self.input.trim().is_empty() {
            return Err(anyhow!("Book input path is required"));
        }
        if self.from_lang.trim().is_empty() || self.to_lang.trim().is_empty() {
            return Err(anyhow!("Book {} needs both from_lang and to_lang", self.input));
        }
        if language_codes_match(&self.from_lang, &self.to_lang) {
            warn!("Book {} translates {} into the same language", self.input, self.from_lang);
        }
        if self.from_chapter == Some(0) || self.to_chapter == Some(0) {
            return Err(anyhow!("Chapter numbers start at 1 for book {}", self.input));
        }
        if let (Some(from), Some(to)) = (self.from_chapter, self.to_chapter) {
            if from > to {
                return Err(anyhow!(
                    "Invalid chapter range {}..{} for book {}",
                    from, to, self.input
                ));
            }
        }

        Ok(())
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama through its OpenAI-compatible endpoint
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Base URL of the chat completions API
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Sampling temperature; kept high so retries get a different phrasing
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Transport retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for transport retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Fixed pause before resending a structurally rejected reply
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Image-count mismatches retried before the mismatch is accepted
    #[serde(default = "default_max_image_retries")]
    pub max_image_retries: u32,

    /// Wrapper mismatches retried before failing; unlimited when absent
    #[serde(default)]
    pub max_wrapper_retries: Option<u32>,

    /// Chunk limit in characters
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Directory for checkpoint records and translated chapter files
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_image_retries: default_max_image_retries(),
            max_wrapper_retries: None,
            max_chunk_size: default_max_chunk_size(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_action() -> String {
    BookAction::Translate.as_str().to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_retry_delay_ms() -> u64 {
    10
}

fn default_max_image_retries() -> u32 {
    5
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_checkpoint_dir() -> String {
    "checkpoint".to_string()
}

fn default_temperature() -> f32 {
    1.1
}

fn default_endpoint(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434/v1".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

fn default_model(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "llama3.2:3b".to_string(),
        TranslationProvider::OpenAI => "gpt-4o-mini".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model".to_string(),
    }
}

impl Config {
    /// Load a config file, writing a default one first when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.provider == TranslationProvider::OpenAI && self.translation.get_api_key().is_empty() {
            return Err(anyhow!("Translation API key is required for OpenAI provider"));
        }

        if self.translation.common.max_chunk_size == 0 {
            return Err(anyhow!("max_chunk_size must be at least 1"));
        }

        for book in self.books.iter().filter(|book| book.run) {
            book.validate()
                .with_context(|| format!("Invalid book configuration for {}", book.input))?;
        }

        Ok(())
    }

    /// Books selected to run, either by name or by their `run` flag.
    ///
    /// A name matches the input path or its file stem.
    pub fn selected_books(&self, name: Option<&str>) -> Vec<&BookConfig> {
        match name {
            Some(name) => self
                .books
                .iter()
                .filter(|book| book.input == name || book.input_stem() == name)
                .collect(),
            None => self.books.iter().filter(|book| book.run).collect(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        let mut sample = BookConfig::new("book.epub", "en", "zh");
        sample.run = false;

        Config {
            books: vec![sample],
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        default_model(&self.provider)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Local servers don't use API keys
        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        default_endpoint(&self.provider)
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Ollama));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::LMStudio));

        config
    }
}
