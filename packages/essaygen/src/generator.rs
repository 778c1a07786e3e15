//! Word-count-constrained generation.
//!
//! The [`Generator`] calls the completion capability up to `max_retries`
//! times, returning as soon as a response has exactly the requested number of
//! words. Longer responses are truncated and kept as candidates, shorter ones
//! are kept as-is. When the budget runs out the closest candidate wins (ties go
//! to the earliest attempt), or an explicit failure marker is returned when
//! fallback is disabled.

use tracing::{debug, info, warn};

use crate::completion::{Completion, CompletionClient};
use crate::config::{GeneratorConfig, FAILURE_MARKER};
use crate::types::{AttemptResult, GenerationOutcome};

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// # Examples
/// ```
/// use essaygen::generator::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  one\n\ntwo\tthree  "), "one two three");
/// ```
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep only the first `limit` words, joined by single spaces.
#[must_use]
pub fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pick the candidate closest to `target`; the first one wins ties.
#[must_use]
pub fn select_closest(candidates: &[AttemptResult], target: usize) -> Option<&AttemptResult> {
    // min_by_key keeps the first of equal minima
    candidates.iter().min_by_key(|c| c.distance(target))
}

/// Drives the completion client for one essay at a time.
pub struct Generator<'a, C: CompletionClient> {
    client: &'a C,
    max_retries: u32,
    fallback: bool,
}

impl<'a, C: CompletionClient> Generator<'a, C> {
    pub fn new(client: &'a C, config: &GeneratorConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            fallback: config.fallback,
        }
    }

    /// Generate text for `prompt` targeting exactly `target` words.
    ///
    /// Never fails: completion failures only consume attempts.
    pub fn generate(&self, prompt: &str, target: usize) -> GenerationOutcome {
        let mut candidates: Vec<AttemptResult> = Vec::new();
        let mut attempts: u32 = 0;

        for attempt in 1..=self.max_retries {
            attempts = attempt;
            debug!(attempt, target, "completion request");

            let raw = match self.client.complete(prompt) {
                Completion::Text(text) => text,
                failure => {
                    let reason = match &failure {
                        Completion::Blocked(reason)
                        | Completion::Stopped(reason)
                        | Completion::Transport(reason) => reason.as_str(),
                        Completion::Empty | Completion::Text(_) => "",
                    };
                    warn!(attempt, kind = failure.kind(), reason, "completion produced no text");
                    continue;
                }
            };

            let text = normalize_whitespace(&raw);
            let words = word_count(&text);

            if text.is_empty() {
                warn!(attempt, "completion returned only whitespace");
                continue;
            }

            if words == target {
                info!(attempt, words, "exact word count");
                return GenerationOutcome {
                    text,
                    succeeded: true,
                    used_fallback: false,
                    attempts,
                };
            }

            if words > target {
                let overage = words - target;
                debug!(attempt, words, target, overage, "truncating long response");
                candidates.push(AttemptResult {
                    text: truncate_words(&text, target),
                    word_count: target,
                    exact: false,
                    overage,
                });
            } else {
                debug!(attempt, words, target, shortfall = target - words, "short response");
                candidates.push(AttemptResult {
                    text,
                    word_count: words,
                    exact: false,
                    overage: 0,
                });
            }
        }

        if !self.fallback {
            warn!(attempts, target, "no exact match and fallback disabled");
            return GenerationOutcome {
                text: FAILURE_MARKER.to_string(),
                succeeded: false,
                used_fallback: false,
                attempts,
            };
        }

        match select_closest(&candidates, target) {
            Some(best) => {
                info!(
                    attempts,
                    words = best.word_count,
                    target,
                    overage = best.overage,
                    "using closest match"
                );
                GenerationOutcome {
                    text: best.text.clone(),
                    succeeded: false,
                    used_fallback: true,
                    attempts,
                }
            }
            None => {
                warn!(attempts, "every attempt failed, leaving essay empty");
                GenerationOutcome {
                    text: String::new(),
                    succeeded: false,
                    used_fallback: false,
                    attempts,
                }
            }
        }
    }
}
