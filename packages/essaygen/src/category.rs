//! Error category detection from input file names.
//!
//! Batch files are named after the scoring dimension they exercise, e.g.
//! `grade8_ses_mech_grammar.csv`. The first keyword (in table order) found
//! anywhere in the file name, ignoring case, selects the category.

use std::path::Path;

use crate::config::DEFAULT_ERROR_CATEGORY;

/// File name keyword to human-readable error category.
pub const ERROR_CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("ses_mech_spelling", "spelling"),
    ("ses_mech_grammar", "grammar"),
    ("ses_mech_punctuation", "punctuation"),
    ("ses_mech_capitalization", "capitalization"),
    ("ses_lang_sentence_structure", "sentence structure"),
    ("ses_lang_vocabulary", "vocabulary"),
    ("ses_lang_precise_language", "precise language"),
];

/// Resolve the error category for a file name.
///
/// # Examples
/// ```
/// use essaygen::category::detect_error_category;
///
/// assert_eq!(detect_error_category("Batch_SES_MECH_Grammar.csv"), "grammar");
/// assert_eq!(detect_error_category("prompts.csv"), "spelling");
/// ```
#[must_use]
pub fn detect_error_category(file_name: &str) -> &'static str {
    let lowered = file_name.to_lowercase();
    ERROR_CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_ERROR_CATEGORY)
}

/// Resolve the error category for a path, looking at its final component only.
#[must_use]
pub fn detect_error_category_for_path(path: &Path) -> &'static str {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let category = detect_error_category(&file_name);
    tracing::debug!(file = %file_name, category, "detected error category");
    category
}
