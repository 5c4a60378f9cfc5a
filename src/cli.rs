use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use hrclean::config::{CleanerConfig, DEFAULT_CONFIG_FILE};
use hrclean::pipeline::run_pipeline;
use hrclean::verify::verify;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "hrclean",
    version,
    about = "Clean a raw HR extract into an analysis-ready table"
)]
pub struct Cli {
    /// Path to a JSON configuration file. Defaults to ./hrclean.json if present.
    #[arg(long, global = true, env = "HRCLEAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cleaning pipeline (the default when no command is given)
    Run {
        /// Raw input file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV output. The workbook is written beside it.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text report path. The CSV summary is written beside it as <stem>.summary.csv.
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Skip the .xlsx copy
        #[arg(long)]
        no_excel: bool,
    },
    /// Check a cleaned file for duplicates and missing values
    Verify {
        /// File to check. Defaults to the configured output.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Write the default configuration as JSON
    InitConfig {
        /// Destination
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run_command(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        output: None,
        report: None,
        no_excel: false,
    });

    match command {
        Commands::Run {
            input,
            output,
            report,
            no_excel,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(input) = input {
                config.input.path = input;
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            if let Some(report) = report {
                config.report.summary_path = report.with_extension("summary.csv");
                config.report.path = report;
            }
            if no_excel {
                config.output.excel = false;
            }
            handle_run(&config)
        }
        Commands::Verify { file } => {
            let config = load_config(cli.config.as_deref())?;
            let file = file.unwrap_or_else(|| config.output.path.clone());
            handle_verify(&file, &config)
        }
        Commands::InitConfig { path, force } => handle_init_config(&path, force),
    }
}

fn load_config(path: Option<&Path>) -> Result<CleanerConfig> {
    if let Some(path) = path {
        println!("Loading config from {}...", path.display());
    }
    CleanerConfig::resolve(path).context("Failed to load configuration")
}

fn handle_run(config: &CleanerConfig) -> Result<()> {
    println!("Starting HR data processing...");
    println!("{}", "-".repeat(50));

    let outcome = run_pipeline(config).context("Pipeline failed")?;

    for stage in &outcome.report.stages {
        println!("{}...", stage.stage.title());
        for note in stage.notes.iter().filter(|n| !n.starts_with(' ')) {
            println!("   {note}");
        }
        for warning in &stage.warnings {
            println!("   Warning: {warning}");
        }
    }

    println!("{}", "-".repeat(50));
    println!("{}", outcome.summary());
    println!("\nOutputs generated:");
    for path in &outcome.written {
        println!("• {}", path.display());
    }
    Ok(())
}

fn handle_verify(file: &Path, config: &CleanerConfig) -> Result<()> {
    println!("Verifying {}...", file.display());

    let report = verify(file, config)
        .with_context(|| format!("Failed to verify {}", file.display()))?;

    println!("   Rows: {}", report.rows);
    println!("   Columns: {}", report.columns);
    println!("   Duplicate rows: {}", report.duplicate_rows);
    if report.missing.is_empty() {
        println!("   Missing values: none");
    } else {
        println!("   Missing values: {}", report.total_missing());
        for m in &report.missing {
            println!("     - {}: {}", m.column, m.missing);
        }
    }
    println!("\nSample:\n{}", report.sample);

    if report.passed() {
        println!("\nVerification passed.");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} failed verification: {} duplicate rows, {} missing values",
            file.display(),
            report.duplicate_rows,
            report.total_missing()
        ))
    }
}

fn handle_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }
    CleanerConfig::default()
        .to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Default configuration written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::parse_from(["hrclean", "-v"]);
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::parse_from([
            "hrclean",
            "run",
            "--input",
            "raw.csv",
            "--no-excel",
            "--config",
            "custom.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
        match cli.command {
            Some(Commands::Run {
                input, no_excel, ..
            }) => {
                assert_eq!(input, Some(PathBuf::from("raw.csv")));
                assert!(no_excel);
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hrclean.json");

        handle_init_config(&path, false)?;
        assert!(handle_init_config(&path, false).is_err());
        handle_init_config(&path, true)?;

        let config = CleanerConfig::from_file(&path)?;
        assert_eq!(config.dedup.identifier_columns, vec!["EmployeeID".to_owned()]);
        Ok(())
    }
}
