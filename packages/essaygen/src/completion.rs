use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::Result;

/// User agent string identifying this tool.
const USER_AGENT: &str = concat!("essaygen/", env!("CARGO_PKG_VERSION"));

/// Outcome of a single completion call.
///
/// Failures are values, not errors: the attempt loop inspects them and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The model returned text.
    Text(String),
    /// The call succeeded but carried no text.
    Empty,
    /// The prompt was blocked by safety filters.
    Blocked(String),
    /// Generation stopped before a normal finish.
    Stopped(String),
    /// Network, HTTP status or decoding failure.
    Transport(String),
}

impl Completion {
    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Empty => "empty",
            Self::Blocked(_) => "blocked",
            Self::Stopped(_) => "stopped",
            Self::Transport(_) => "transport",
        }
    }
}

/// Trait for completion clients, enabling mocking in tests.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Completion;
}

/// Gemini `generateContent` client.
///
/// NOTE: Do NOT derive `Debug` on this struct, `api_key` would be exposed.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Finish reasons that mean the model ended normally.
const NORMAL_FINISH_REASONS: &[&str] = &["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];

impl GeminiClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        builder = match config.timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            // The blocking client defaults to 30s; disable it unless asked for one
            None => builder.timeout(None::<Duration>),
        };
        let http = builder.build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: generate_content_url(&config.api_base_url, &config.model),
            temperature: config.temperature,
        })
    }
}

/// Build the `generateContent` URL for a model, with or without the `models/` prefix.
pub fn generate_content_url(api_base_url: &str, model: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{base}/v1beta/models/{model}:generateContent")
}

impl CompletionClient for GeminiClient {
    fn complete(&self, prompt: &str) -> Completion {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let resp = match self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
        {
            Ok(r) => r,
            Err(e) => return Completion::Transport(format!("request failed: {e}")),
        };

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body_text);
            return Completion::Transport(format!("status {}: {message}", status.as_u16()));
        }

        let api_response: GenerateResponse = match resp.json() {
            Ok(r) => r,
            Err(e) => return Completion::Transport(format!("failed to parse response: {e}")),
        };

        interpret_response(api_response)
    }
}

fn interpret_response(response: GenerateResponse) -> Completion {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Completion::Blocked(reason);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Completion::Empty;
    };

    if let Some(ref reason) = candidate.finish_reason {
        if !NORMAL_FINISH_REASONS.contains(&reason.as_str()) {
            return Completion::Stopped(reason.clone());
        }
    }

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        debug!(finish_reason = ?candidate.finish_reason, "candidate carried no text");
        Completion::Empty
    } else {
        Completion::Text(text)
    }
}

/// Test utilities for the completion client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock client returning pre-configured completions in order.
    ///
    /// When the script runs out, the last completion repeats; an empty script
    /// yields `Completion::Empty`.
    pub struct MockCompletionClient {
        responses: Mutex<Vec<Completion>>,
        last: Mutex<Option<Completion>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockCompletionClient {
        pub fn new(responses: Vec<Completion>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn with_text(text: &str) -> Self {
            Self::new(vec![Completion::Text(text.to_string())])
        }

        pub fn with_texts(texts: Vec<&str>) -> Self {
            Self::new(
                texts
                    .into_iter()
                    .map(|t| Completion::Text(t.to_string()))
                    .collect(),
            )
        }

        /// Number of `complete` calls so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Prompts received, in call order.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    impl CompletionClient for MockCompletionClient {
        fn complete(&self, prompt: &str) -> Completion {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }

            let (Ok(mut responses), Ok(mut last)) = (self.responses.lock(), self.last.lock())
            else {
                return Completion::Transport("mock lock poisoned".into());
            };
            match responses.pop() {
                Some(next) => {
                    *last = Some(next.clone());
                    next
                }
                None => last.clone().unwrap_or(Completion::Empty),
            }
        }
    }
}
