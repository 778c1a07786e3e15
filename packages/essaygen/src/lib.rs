//! essaygen - Generate synthetic student essays with targeted errors.
//!
//! This crate reads a CSV of writing prompts, asks a generative-language API
//! for an essay per row with a given grade, genre, length and number of
//! intentional errors, and writes the essays back into the CSV.
//!
//! # Example
//!
//! ```
//! use essaygen::{build_prompt, GenerationRequest};
//!
//! let request = GenerationRequest::new(8, "narrative", "A storm at sea", 200, "grammar", 5.0);
//! assert_eq!(request.error_count, 10);
//! assert!(build_prompt(&request).contains("exactly 200 words"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and the [`GeneratorConfig`] loaded from the environment
//! - [`types`]: Requests, attempts and outcomes
//! - [`error`]: Error types and Result alias
//! - [`category`]: Error category detection from file names
//! - [`prompt`]: Prompt construction
//! - [`completion`]: Completion client trait and the Gemini HTTP client
//! - [`generator`]: Retry, trim and closest-match policy
//! - [`dataset`]: CSV reading and writing
//! - [`batch`]: Row-by-row batch service
//! - [`cli`]: Command-line interface

pub mod batch;
pub mod category;
pub mod cli;
pub mod completion;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod types;

// Re-export main functions
pub use batch::{run_batch, BatchReport};
pub use prompt::build_prompt;

// Re-export commonly used items
pub use category::detect_error_category;
pub use completion::{Completion, CompletionClient, GeminiClient};
pub use config::GeneratorConfig;
pub use dataset::{Dataset, RequestOverrides};
pub use error::{EssayError, Result};
pub use generator::Generator;
pub use types::{AttemptResult, GenerationOutcome, GenerationRequest, OutputColumn};
