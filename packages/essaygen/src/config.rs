//! Configuration constants and the generator configuration object.

use std::fmt;

use crate::error::{EssayError, Result};
use crate::types::OutputColumn;

/// Default Gemini model identifier.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-lite-001";

/// Base URL of the Generative Language REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Number of completion attempts per essay.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Grade used when `instructionalLevel` is missing or unparseable.
pub const DEFAULT_GRADE_LEVEL: u32 = 8;

/// Word count used when `no of words` is missing or unparseable.
pub const DEFAULT_WORD_COUNT: usize = 50;

/// Genre used when `promptType` is empty.
pub const DEFAULT_PROMPT_TYPE: &str = "informational";

/// Error category used when the input file name matches no keyword.
pub const DEFAULT_ERROR_CATEGORY: &str = "spelling";

/// Topic used when `promptText` is empty.
pub const DEFAULT_EDITORIAL_PROMPT: &str = "Think of a problem that people face in your \
    neighborhood or school. Write an editorial to your local newspaper presenting a solution \
    to the problem you have identified.";

/// Literal marker the model is asked to put between paragraphs.
pub const PARAGRAPH_MARKER: &str = "\\n";

/// Value written into the provenance column of every processed row.
pub const AI_GENERATED_MARKER: &str = "YES";

/// Name of the provenance column.
pub const AI_GENERATED_COLUMN: &str = "aiGenerated";

/// Text returned instead of an essay when no exact match was produced
/// and closest-match fallback is disabled.
pub const FAILURE_MARKER: &str =
    "[GENERATION FAILED: no response matched the requested word count]";

/// Configuration for the generation run.
///
/// Built once at process start and passed by reference into the client and
/// the attempt loop. `Debug` is implemented by hand so the key never leaks
/// into logs.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub temperature: Option<f64>,
    pub max_retries: u32,
    pub timeout_secs: Option<u64>,
    pub fallback: bool,
    pub output_column: OutputColumn,
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("fallback", &self.fallback)
            .field("output_column", &self.output_column)
            .finish()
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    ///
    /// `GEMINI_API_KEY` is required; there is no built-in credential.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                EssayError::Config(
                    "GEMINI_API_KEY not set. Create a key at https://aistudio.google.com/app/apikey \
                     and export it before running"
                        .into(),
                )
            })?;

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());

        let api_base_url =
            lookup("GEMINI_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let temperature = lookup("GEMINI_TEMPERATURE").and_then(|v| v.parse().ok());

        let max_retries = lookup("ESSAYGEN_MAX_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let timeout_secs = lookup("ESSAYGEN_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok());

        Ok(Self {
            api_key,
            model,
            api_base_url,
            temperature,
            max_retries,
            timeout_secs,
            fallback: true,
            output_column: OutputColumn::default(),
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_key: impl Into<String>) -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            temperature: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: None,
            fallback: true,
            output_column: OutputColumn::default(),
        }
    }
}

/// Builder for constructing `GeneratorConfig` in tests.
pub struct GeneratorConfigBuilder {
    api_key: String,
    model: String,
    api_base_url: String,
    temperature: Option<f64>,
    max_retries: u32,
    timeout_secs: Option<u64>,
    fallback: bool,
    output_column: OutputColumn,
}

impl GeneratorConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn output_column(mut self, output_column: OutputColumn) -> Self {
        self.output_column = output_column;
        self
    }

    pub fn build(self) -> GeneratorConfig {
        GeneratorConfig {
            api_key: self.api_key,
            model: self.model,
            api_base_url: self.api_base_url,
            temperature: self.temperature,
            max_retries: self.max_retries,
            timeout_secs: self.timeout_secs,
            fallback: self.fallback,
            output_column: self.output_column,
        }
    }
}
