//! Command-line interface for essaygen.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::run_batch;
use crate::category::detect_error_category_for_path;
use crate::completion::GeminiClient;
use crate::config::GeneratorConfig;
use crate::dataset::{default_output_path, Dataset, RequestOverrides};
use crate::error::{EssayError, Result};
use crate::prompt::build_prompt;
use crate::types::OutputColumn;

/// essaygen - Generate synthetic student essays with targeted errors.
#[derive(Parser)]
#[command(name = "essaygen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options that shape every request in the batch.
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// Error category to inject (default: detected from the input file name)
    #[arg(short, long)]
    pub error_category: Option<String>,

    /// Grade level for every row, ignoring `instructionalLevel`
    #[arg(long)]
    pub grade_level: Option<u32>,

    /// Word count for every row, ignoring `no of words`
    #[arg(long)]
    pub word_count: Option<usize>,
}

impl RequestArgs {
    fn overrides(&self) -> RequestOverrides {
        RequestOverrides {
            grade_level: self.grade_level,
            word_count: self.word_count,
        }
    }

    fn error_category(&self, input: &Path) -> String {
        self.error_category
            .clone()
            .unwrap_or_else(|| detect_error_category_for_path(input).to_string())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an essay for every row of a CSV file.
    Generate {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (default: <input>_generated.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column that receives the essay
        #[arg(long, value_enum, default_value_t = OutputColumn::Essay)]
        column: OutputColumn,

        /// Completion attempts per essay (default: ESSAYGEN_MAX_RETRIES or 3)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Model identifier (default: GEMINI_MODEL or models/gemini-2.0-flash-lite-001)
        #[arg(long)]
        model: Option<String>,

        /// Write a failure marker instead of the closest near-miss
        #[arg(long)]
        no_fallback: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the prompt for one row without calling the API.
    Prompt {
        /// Input CSV file
        input: PathBuf,

        /// Zero-based row index
        #[arg(short, long, default_value_t = 0)]
        row: usize,

        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            column,
            max_retries,
            model,
            no_fallback,
            request,
        } => {
            let mut config = GeneratorConfig::from_env()?;
            config.output_column = column;
            config.fallback = !no_fallback;
            if let Some(max_retries) = max_retries {
                config.max_retries = max_retries;
            }
            if let Some(model) = model {
                config.model = model;
            }
            generate_command(&config, &input, output.as_deref(), &request)
        }
        Commands::Prompt {
            input,
            row,
            request,
        } => prompt_command(&input, row, &request),
    }
}

/// Load and validate the input file.
fn load_input(input: &Path) -> Result<Dataset> {
    if !input.is_file() {
        return Err(EssayError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", input.display()),
        )));
    }
    let dataset = Dataset::read(input)?;
    dataset.validate()?;
    Ok(dataset)
}

/// Execute the generate command.
fn generate_command(
    config: &GeneratorConfig,
    input: &Path,
    output: Option<&Path>,
    request: &RequestArgs,
) -> Result<()> {
    let dataset = load_input(input)?;
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    // Validate output directory exists before spending API calls
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(EssayError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Output directory does not exist: {}", parent.display()),
            )));
        }
    }

    let error_category = request.error_category(input);
    let overrides = request.overrides();
    let client = GeminiClient::new(config)?;

    println!(
        "{} {} essays ({} errors) with {}",
        style("Generating").bold(),
        style(dataset.len()).cyan(),
        style(&error_category).yellow(),
        style(&config.model).green()
    );
    println!();

    let pb = ProgressBar::new(dataset.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = run_batch(
        &client,
        config,
        dataset,
        &error_category,
        &overrides,
        &output_path,
        |row, outcome| {
            let status = if outcome.succeeded {
                "exact"
            } else if outcome.used_fallback {
                "closest match"
            } else {
                "failed"
            };
            pb.set_message(format!("row {}: {status}", row + 1));
            pb.inc(1);
        },
    );
    pb.finish_and_clear();
    let report = result?;

    println!("  Exact: {}", style(report.exact).green());
    println!("  Closest match: {}", style(report.fallback).yellow());
    if report.failed > 0 {
        println!("  Failed: {}", style(report.failed).red().bold());
    }
    println!("  API calls: {}", report.attempts);
    println!();
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        output_path.display()
    );

    Ok(())
}

/// Execute the prompt command.
fn prompt_command(input: &Path, row: usize, request: &RequestArgs) -> Result<()> {
    let dataset = load_input(input)?;
    let generation = dataset.request(row, &request.error_category(input), &request.overrides())?;
    println!("{}", build_prompt(&generation));
    Ok(())
}
