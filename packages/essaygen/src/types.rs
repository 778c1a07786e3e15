//! Core data types for essay generation.

/// Column the generated essay is written into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputColumn {
    /// Write into `essay`.
    #[default]
    Essay,

    /// Write into `generatedResponse`.
    GeneratedResponse,
}

impl OutputColumn {
    /// Header name used in the output CSV.
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Self::Essay => "essay",
            Self::GeneratedResponse => "generatedResponse",
        }
    }
}

/// Everything the prompt builder needs for a single essay.
///
/// Built once per input record. `error_count` is derived in [`GenerationRequest::new`]
/// and kept consistent with `target_word_count` and `error_percentage`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub instructional_level: u32,
    pub prompt_type: String,
    pub prompt_text: String,
    pub target_word_count: usize,
    pub error_category: String,
    /// Error rate as given in the input; either a fraction or a percentage.
    pub error_percentage: f64,
    pub error_count: usize,
    pub sub_dimension: Option<String>,
    pub purpose_org: Option<String>,
    pub dev_of_ideas: Option<String>,
    pub lang_conventions: Option<String>,
    pub editorial_prompt: Option<String>,
}

impl GenerationRequest {
    /// Create a request, deriving `error_count` from the word count and error rate.
    pub fn new(
        instructional_level: u32,
        prompt_type: impl Into<String>,
        prompt_text: impl Into<String>,
        target_word_count: usize,
        error_category: impl Into<String>,
        error_percentage: f64,
    ) -> Self {
        Self {
            instructional_level,
            prompt_type: prompt_type.into(),
            prompt_text: prompt_text.into(),
            target_word_count,
            error_category: error_category.into(),
            error_percentage,
            error_count: error_count(target_word_count, error_percentage),
            sub_dimension: None,
            purpose_org: None,
            dev_of_ideas: None,
            lang_conventions: None,
            editorial_prompt: None,
        }
    }

    pub fn with_sub_dimension(mut self, value: Option<String>) -> Self {
        self.sub_dimension = value;
        self
    }

    pub fn with_purpose_org(mut self, value: Option<String>) -> Self {
        self.purpose_org = value;
        self
    }

    pub fn with_dev_of_ideas(mut self, value: Option<String>) -> Self {
        self.dev_of_ideas = value;
        self
    }

    pub fn with_lang_conventions(mut self, value: Option<String>) -> Self {
        self.lang_conventions = value;
        self
    }

    pub fn with_editorial_prompt(mut self, value: Option<String>) -> Self {
        self.editorial_prompt = value;
        self
    }
}

/// Normalize an error rate to a fraction.
///
/// Values above 1 are read as percentages. Exactly 1 stays a fraction (100%).
/// Negative and non-finite inputs become 0.
#[must_use]
pub fn error_fraction(error_percentage: f64) -> f64 {
    if !error_percentage.is_finite() || error_percentage <= 0.0 {
        0.0
    } else if error_percentage > 1.0 {
        error_percentage / 100.0
    } else {
        error_percentage
    }
}

/// Number of errors to request: `round(words × fraction)`.
#[must_use]
pub fn error_count(target_word_count: usize, error_percentage: f64) -> usize {
    let count = (target_word_count as f64 * error_fraction(error_percentage)).round();
    count.max(0.0) as usize
}

/// One completion attempt that did not match the target exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// Whitespace-normalized (and possibly truncated) text.
    pub text: String,
    /// Word count of `text`.
    pub word_count: usize,
    /// Whether the model produced exactly the target length.
    pub exact: bool,
    /// Words cut off by truncation; 0 for short or exact attempts.
    pub overage: usize,
}

impl AttemptResult {
    /// Absolute distance of this candidate from the target length.
    #[must_use]
    pub fn distance(&self, target: usize) -> usize {
        self.word_count.abs_diff(target)
    }
}

/// Final result for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationOutcome {
    pub text: String,
    /// The model produced exactly the requested word count.
    pub succeeded: bool,
    /// The text was picked by closest-match selection.
    pub used_fallback: bool,
    /// Completion calls made for this request.
    pub attempts: u32,
}

impl GenerationOutcome {
    /// True when the outcome carries no essay text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
