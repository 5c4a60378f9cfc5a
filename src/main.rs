//! # hrclean command-line entry point
//!
//! ```bash
//! hrclean                          # run the pipeline with defaults
//! hrclean run --input raw.csv      # override paths
//! hrclean verify                   # check the cleaned output
//! hrclean init-config              # write hrclean.json
//! ```
//!
//! Running without a subcommand is the same as `hrclean run`.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // CLI output

mod cli;

use clap::Parser as _;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    if let Err(err) = hrclean::logging::init(cli.verbose) {
        eprintln!("Warning: logging unavailable: {err:#}");
    }

    cli::run_command(cli)
}
