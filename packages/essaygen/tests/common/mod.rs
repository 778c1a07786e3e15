//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use essaygen::{Completion, CompletionClient};

/// Client that replays a fixed script of completions and records prompts.
pub struct ScriptedClient {
    script: Mutex<Vec<Completion>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(mut script: Vec<Completion>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[String]) -> Self {
        Self::new(texts.iter().cloned().map(Completion::Text).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, prompt: &str) -> Completion {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop())
            .unwrap_or_else(|| Completion::Transport("script exhausted".into()))
    }
}

/// `n` distinct words, `prefix1 prefix2 ...`.
pub fn words(n: usize, prefix: &str) -> String {
    (1..=n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// CSV with the required header and the given `(prompt, words, % errors)` rows.
pub fn input_csv(rows: &[(&str, usize, &str)]) -> String {
    let mut csv = String::from(
        "instructionalLevel,promptType,promptText,no of words,total count errors,% of errors\n",
    );
    for (prompt, words, pct) in rows {
        csv.push_str(&format!("8,informational,{prompt},{words},0,{pct}\n"));
    }
    csv
}
