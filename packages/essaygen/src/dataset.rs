//! CSV dataset loading, validation and writing.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{
    DEFAULT_EDITORIAL_PROMPT, DEFAULT_GRADE_LEVEL, DEFAULT_PROMPT_TYPE, DEFAULT_WORD_COUNT,
};
use crate::error::{EssayError, Result};
use crate::types::GenerationRequest;

pub const COL_INSTRUCTIONAL_LEVEL: &str = "instructionalLevel";
pub const COL_PROMPT_TYPE: &str = "promptType";
pub const COL_PROMPT_TEXT: &str = "promptText";
pub const COL_WORD_COUNT: &str = "no of words";
pub const COL_TOTAL_ERRORS: &str = "total count errors";
pub const COL_ERROR_PERCENTAGE: &str = "% of errors";
pub const COL_SUB_DIMENSION: &str = "subDimension";
pub const COL_PURPOSE_ORG: &str = "purposeOrg";
pub const COL_DEV_OF_IDEAS: &str = "devOfIdeas";
pub const COL_LANG_CONVENTIONS: &str = "langConventions";
pub const COL_EDITORIAL_PROMPT: &str = "editorialPrompt";

/// Columns every input file must have.
pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_INSTRUCTIONAL_LEVEL,
    COL_PROMPT_TYPE,
    COL_PROMPT_TEXT,
    COL_WORD_COUNT,
    COL_TOTAL_ERRORS,
    COL_ERROR_PERCENTAGE,
];

/// First run of digits, e.g. the `7` in `Grade 7`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Batch-wide values that replace the per-row ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOverrides {
    pub grade_level: Option<u32>,
    pub word_count: Option<usize>,
}

/// An in-memory CSV file: one header row plus records of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Read a dataset from a CSV file.
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            EssayError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot open input {}: {e}", path.display()),
            ))
        })?;
        Self::from_reader(file)
    }

    /// Read a dataset from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let mut headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect::<Vec<String>>());
        }

        // Cells past the last header get unnamed columns so appended
        // columns never land on top of them
        let width = rows.iter().map(Vec::len).fold(headers.len(), usize::max);
        if width > headers.len() {
            tracing::warn!(
                headers = headers.len(),
                widest_row = width,
                "rows are wider than the header, adding unnamed columns"
            );
            headers.resize(width, String::new());
        }
        for row in &mut rows {
            row.resize(width, String::new());
        }

        tracing::debug!(columns = width, rows = rows.len(), "loaded dataset");
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that all required columns are present.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EssayError::MissingColumns { columns: missing })
        }
    }

    /// Find a column, ignoring surrounding whitespace and ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Raw cell value, untrimmed.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Trimmed cell value, or `None` when missing or blank.
    pub fn field(&self, row: usize, column: &str) -> Option<&str> {
        self.cell(row, column)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Add a column, or overwrite it if it already exists.
    ///
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(EssayError::InvalidInput(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        let index = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= index {
                row.resize(index + 1, String::new());
            }
            row[index] = value;
        }
        Ok(())
    }

    /// Build the generation request for one row.
    pub fn request(
        &self,
        row: usize,
        error_category: &str,
        overrides: &RequestOverrides,
    ) -> Result<GenerationRequest> {
        if row >= self.rows.len() {
            return Err(EssayError::InvalidInput(format!(
                "row {row} out of range (dataset has {} rows)",
                self.rows.len()
            )));
        }

        let grade = overrides.grade_level.unwrap_or_else(|| {
            parse_grade_level(self.field(row, COL_INSTRUCTIONAL_LEVEL).unwrap_or_default())
        });
        let words = overrides.word_count.unwrap_or_else(|| {
            parse_word_count(self.field(row, COL_WORD_COUNT).unwrap_or_default())
        });
        let percentage =
            parse_error_percentage(self.field(row, COL_ERROR_PERCENTAGE).unwrap_or_default());

        let prompt_type = self
            .field(row, COL_PROMPT_TYPE)
            .unwrap_or(DEFAULT_PROMPT_TYPE);
        let prompt_text = self
            .field(row, COL_PROMPT_TEXT)
            .unwrap_or(DEFAULT_EDITORIAL_PROMPT);

        let optional = |column: &str| self.field(row, column).map(String::from);

        Ok(
            GenerationRequest::new(grade, prompt_type, prompt_text, words, error_category, percentage)
                .with_sub_dimension(optional(COL_SUB_DIMENSION))
                .with_purpose_org(optional(COL_PURPOSE_ORG))
                .with_dev_of_ideas(optional(COL_DEV_OF_IDEAS))
                .with_lang_conventions(optional(COL_LANG_CONVENTIONS))
                .with_editorial_prompt(optional(COL_EDITORIAL_PROMPT)),
        )
    }

    /// Write the dataset to a CSV file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    /// Write the dataset to any sink.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Default output path: `<stem>_generated.csv` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "essays".to_string());
    input.with_file_name(format!("{stem}_generated.csv"))
}

/// Grade from free text such as `8`, `Grade 8` or `8th`.
pub fn parse_grade_level(value: &str) -> u32 {
    INTEGER_PATTERN
        .find(value)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_GRADE_LEVEL)
}

/// Word count from `250` or spreadsheet-style `250.0`.
pub fn parse_word_count(value: &str) -> usize {
    let value = value.trim();
    value
        .parse::<usize>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as usize)
        })
        .unwrap_or(DEFAULT_WORD_COUNT)
}

/// Error rate from `0.05`, `5` or `5%`.
///
/// A bare number is passed through and the fraction/percentage decision is
/// left to [`crate::types::error_fraction`]. A `%` suffix is always a
/// percentage, so it is converted to a fraction here (capped at 1).
pub fn parse_error_percentage(value: &str) -> f64 {
    let value = value.trim();
    let (number, is_percent) = match value.strip_suffix('%') {
        Some(number) => (number.trim(), true),
        None => (value, false),
    };

    let Some(rate) = number.parse::<f64>().ok().filter(|v| v.is_finite()) else {
        return 0.0;
    };
    if is_percent {
        (rate / 100.0).min(1.0)
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
instructionalLevel,promptType,promptText,no of words,total count errors,% of errors,subDimension
Grade 7,argumentative,Should homework be banned?,120,6,5,persuasive
8,narrative,A day I will never forget,40,2,0.05,
,,,,,,
";

    fn sample() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_and_validate() {
        let dataset = sample();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.headers().len(), 7);
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_missing_required_columns() {
        let dataset =
            Dataset::from_reader("instructionalLevel,promptText\n8,Topic\n".as_bytes()).unwrap();
        let err = dataset.validate().unwrap_err();
        match err {
            EssayError::MissingColumns { columns } => assert_eq!(
                columns,
                vec!["promptType", "no of words", "total count errors", "% of errors"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_lookup_is_lenient() {
        let dataset = Dataset::from_reader(
            " InstructionalLevel ,PROMPTTYPE,promptText,No Of Words,total count errors,% of errors\n"
                .as_bytes(),
        )
        .unwrap();
        assert!(dataset.validate().is_ok());
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_request_from_row() {
        let dataset = sample();
        let request = dataset
            .request(0, "grammar", &RequestOverrides::default())
            .unwrap();
        assert_eq!(request.instructional_level, 7);
        assert_eq!(request.prompt_type, "argumentative");
        assert_eq!(request.prompt_text, "Should homework be banned?");
        assert_eq!(request.target_word_count, 120);
        assert_eq!(request.error_count, 6);
        assert_eq!(request.error_category, "grammar");
        assert_eq!(request.sub_dimension.as_deref(), Some("persuasive"));
        assert_eq!(request.purpose_org, None);

        let request = dataset
            .request(1, "grammar", &RequestOverrides::default())
            .unwrap();
        assert_eq!(request.error_count, 2);
        assert_eq!(request.sub_dimension, None);
    }

    #[test]
    fn test_blank_row_uses_defaults() {
        let request = sample()
            .request(2, "spelling", &RequestOverrides::default())
            .unwrap();
        assert_eq!(request.instructional_level, DEFAULT_GRADE_LEVEL);
        assert_eq!(request.target_word_count, DEFAULT_WORD_COUNT);
        assert_eq!(request.error_percentage, 0.0);
        assert_eq!(request.error_count, 0);
        assert_eq!(request.prompt_type, DEFAULT_PROMPT_TYPE);
        assert_eq!(request.prompt_text, DEFAULT_EDITORIAL_PROMPT);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = RequestOverrides {
            grade_level: Some(10),
            word_count: Some(300),
        };
        let request = sample().request(0, "grammar", &overrides).unwrap();
        assert_eq!(request.instructional_level, 10);
        assert_eq!(request.target_word_count, 300);
        assert_eq!(request.error_count, 15);
    }

    #[test]
    fn test_request_out_of_range() {
        let result = sample().request(9, "grammar", &RequestOverrides::default());
        assert!(matches!(result, Err(EssayError::InvalidInput(_))));
    }

    #[test]
    fn test_set_column_appends_and_overwrites() {
        let mut dataset = sample();
        dataset
            .set_column("essay", vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        assert_eq!(dataset.headers().last().map(String::as_str), Some("essay"));
        assert_eq!(dataset.cell(1, "essay"), Some("b"));

        dataset
            .set_column("ESSAY", vec!["x".into(), "y".into(), "z".into()])
            .unwrap();
        assert_eq!(dataset.headers().len(), 8);
        assert_eq!(dataset.cell(1, "essay"), Some("y"));
    }

    #[test]
    fn test_set_column_keeps_cells_past_the_header() {
        let input = "\
instructionalLevel,promptType,promptText,no of words,total count errors,% of errors
8,narrative,Topic,3,0,0,EXTRA1,EXTRA2
8,narrative,Other,3,0,0
";
        let mut dataset = Dataset::from_reader(input.as_bytes()).unwrap();
        assert_eq!(dataset.headers().len(), 8);
        assert!(dataset.validate().is_ok());

        dataset
            .set_column("essay", vec!["the essay".into(), "another".into()])
            .unwrap();
        dataset
            .set_column("aiGenerated", vec!["YES".into(), "YES".into()])
            .unwrap();

        let mut buffer = Vec::new();
        dataset.to_writer(&mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "instructionalLevel,promptType,promptText,no of words,total count errors,% of errors,,,essay,aiGenerated"
        );
        assert_eq!(lines[1], "8,narrative,Topic,3,0,0,EXTRA1,EXTRA2,the essay,YES");
        assert_eq!(lines[2], "8,narrative,Other,3,0,0,,,another,YES");
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut dataset = sample();
        assert!(dataset.set_column("essay", vec!["only one".into()]).is_err());
    }

    #[test]
    fn test_write_then_read_preserves_text() {
        let mut dataset = sample();
        let essay = "First, \"quoted\" words, commas, and a literal \\n marker.".to_string();
        dataset
            .set_column("essay", vec![essay.clone(), String::new(), "x".into()])
            .unwrap();

        let mut buffer = Vec::new();
        dataset.to_writer(&mut buffer).unwrap();
        let reloaded = Dataset::from_reader(buffer.as_slice()).unwrap();

        assert_eq!(reloaded.cell(0, "essay"), Some(essay.as_str()));
        assert_eq!(reloaded, dataset);
    }

    #[test]
    fn test_parse_grade_level() {
        assert_eq!(parse_grade_level("8"), 8);
        assert_eq!(parse_grade_level("Grade 11"), 11);
        assert_eq!(parse_grade_level("6th"), 6);
        assert_eq!(parse_grade_level("senior"), DEFAULT_GRADE_LEVEL);
    }

    #[test]
    fn test_parse_word_count() {
        assert_eq!(parse_word_count("250"), 250);
        assert_eq!(parse_word_count("250.0"), 250);
        assert_eq!(parse_word_count("-5"), DEFAULT_WORD_COUNT);
        assert_eq!(parse_word_count("lots"), DEFAULT_WORD_COUNT);
    }

    #[test]
    fn test_parse_error_percentage() {
        assert_eq!(parse_error_percentage("0.05"), 0.05);
        assert_eq!(parse_error_percentage("5"), 5.0);
        assert_eq!(parse_error_percentage(" 5 % "), 0.05);
        assert_eq!(parse_error_percentage("n/a"), 0.0);
        assert_eq!(parse_error_percentage("%"), 0.0);
    }

    #[test]
    fn test_percent_suffix_is_never_a_fraction() {
        assert_eq!(parse_error_percentage("0.5%"), 0.005);
        assert_eq!(parse_error_percentage("1%"), 0.01);
        assert_eq!(parse_error_percentage("100%"), 1.0);
        assert_eq!(parse_error_percentage("250%"), 1.0);

        let request = GenerationRequest::new(
            8,
            "narrative",
            "Topic",
            200,
            "spelling",
            parse_error_percentage("0.5%"),
        );
        assert_eq!(request.error_count, 1);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/ses_mech_grammar.csv")),
            PathBuf::from("/data/ses_mech_grammar_generated.csv")
        );
    }
}
