//! Batch service that ties prompt building, generation and the dataset together.

use std::path::Path;

use tracing::info;

use crate::completion::CompletionClient;
use crate::config::{GeneratorConfig, AI_GENERATED_COLUMN, AI_GENERATED_MARKER};
use crate::dataset::{Dataset, RequestOverrides};
use crate::error::Result;
use crate::generator::Generator;
use crate::prompt::build_prompt;
use crate::types::GenerationOutcome;

/// Summary of a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    /// Rows whose essay matched the word count exactly.
    pub exact: usize,
    /// Rows that fell back to the closest candidate.
    pub fallback: usize,
    /// Rows left empty or carrying the failure marker.
    pub failed: usize,
    pub attempts: u64,
}

impl BatchReport {
    fn from_outcomes(outcomes: &[GenerationOutcome]) -> Self {
        let mut report = Self {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            report.attempts += u64::from(outcome.attempts);
            if outcome.succeeded {
                report.exact += 1;
            } else if outcome.used_fallback {
                report.fallback += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

/// Generate one outcome per dataset row, in row order.
///
/// `on_row` is called after each row with its index and outcome, for progress display.
pub fn generate_outcomes<C, F>(
    client: &C,
    config: &GeneratorConfig,
    dataset: &Dataset,
    error_category: &str,
    overrides: &RequestOverrides,
    mut on_row: F,
) -> Result<Vec<GenerationOutcome>>
where
    C: CompletionClient,
    F: FnMut(usize, &GenerationOutcome),
{
    dataset.validate()?;

    let generator = Generator::new(client, config);
    let mut outcomes = Vec::with_capacity(dataset.len());

    for row in 0..dataset.len() {
        let request = dataset.request(row, error_category, overrides)?;
        let prompt = build_prompt(&request);
        info!(
            row,
            target = request.target_word_count,
            errors = request.error_count,
            category = %request.error_category,
            "generating essay"
        );

        let outcome = generator.generate(&prompt, request.target_word_count);
        on_row(row, &outcome);
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Write outcomes into the dataset's essay and provenance columns.
pub fn apply_outcomes(
    dataset: &mut Dataset,
    config: &GeneratorConfig,
    outcomes: Vec<GenerationOutcome>,
) -> Result<()> {
    let markers = vec![AI_GENERATED_MARKER.to_string(); outcomes.len()];
    let essays = outcomes.into_iter().map(|o| o.text).collect();
    dataset.set_column(config.output_column.header(), essays)?;
    dataset.set_column(AI_GENERATED_COLUMN, markers)?;
    Ok(())
}

/// Run a whole batch: generate every row, then save once to `output`.
///
/// Nothing is written until every row has been processed.
pub fn run_batch<C, F>(
    client: &C,
    config: &GeneratorConfig,
    mut dataset: Dataset,
    error_category: &str,
    overrides: &RequestOverrides,
    output: &Path,
    on_row: F,
) -> Result<BatchReport>
where
    C: CompletionClient,
    F: FnMut(usize, &GenerationOutcome),
{
    let outcomes = generate_outcomes(client, config, &dataset, error_category, overrides, on_row)?;
    let report = BatchReport::from_outcomes(&outcomes);

    apply_outcomes(&mut dataset, config, outcomes)?;
    dataset.write(output)?;

    info!(
        rows = report.total,
        exact = report.exact,
        fallback = report.fallback,
        failed = report.failed,
        output = %output.display(),
        "batch complete"
    );
    Ok(report)
}
