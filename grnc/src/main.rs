//! # Grnc CLI Entry Point
//!
//! The executable driving the fixture conversion pipeline:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs
//!    the tracing subscriber (`RUST_LOG` controls verbosity).
//! 2. **Parsing**: Reads each fixture pair and parses both files through `grnc_grntest`.
//! 3. **Reconciliation**: Combines the request and expected streams by sequence count.
//! 4. **Emission**: Writes the generated test source next to its siblings or to stdout.
//!
//! Failures are per fixture: a file that cannot be parsed or reconciled is reported
//! and the driver moves on to the next one.
mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use grnc_grntest::combiner::{CombineError, combine};
use grnc_grntest::convert::{Converted, convert};
use grnc_grntest::element::{GrnTestElement, Response};
use grnc_grntest::parser::parse;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    match args.command {
        Commands::Convert {
            requests,
            output_dir,
        } => run_convert(&requests, output_dir.as_deref()),
        Commands::Inspect { fixture } => match run_inspect(&fixture) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_convert(requests: &[std::path::PathBuf], output_dir: Option<&Path>) -> ExitCode {
    let mut failures = 0usize;
    for request in requests {
        if let Err(err) = convert_pair(request, output_dir) {
            error!("{err:#}");
            failures += 1;
        }
    }
    if failures > 0 {
        error!("{failures} of {} fixture(s) failed to convert", requests.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn convert_pair(request_path: &Path, output_dir: Option<&Path>) -> anyhow::Result<()> {
    let fixture_name = fixture_name(request_path);
    let expected_path = request_path.with_extension("expected");

    let request = parse_file(request_path)?;
    let expected = parse_file(&expected_path)?;

    let combined = match combine(request, &expected) {
        Ok(combined) => combined,
        Err(err @ CombineError::CountMismatch { .. }) => {
            warn!("skipping '{fixture_name}': {err}");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to reconcile '{fixture_name}'"));
        }
    };

    match convert(&fixture_name, &combined) {
        Converted::Omitted => info!("'{fixture_name}' opted out via #@omit"),
        Converted::Source(source) => match output_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create '{}'", dir.display()))?;
                let path = dir.join(format!("{}.rs", fixture_name.replace('-', "_")));
                std::fs::write(&path, &source)
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                info!("converted '{fixture_name}' -> '{}'", path.display());
            }
            None => print!("{source}"),
        },
    }
    Ok(())
}

fn run_inspect(fixture_path: &Path) -> anyhow::Result<()> {
    let elements = parse_file(fixture_path)?;
    for element in &elements {
        match element {
            GrnTestElement::Command(command) => {
                println!("command #{} {}", command.count, command.name);
                for (key, value) in &command.arguments {
                    println!("  --{key} {value}");
                }
                match &command.response {
                    Some(Response::Json(value)) => {
                        println!("  response: {}", serde_json::to_string_pretty(value)?)
                    }
                    Some(Response::Raw(text)) => println!("  response (raw): {text}"),
                    None => {}
                }
            }
            GrnTestElement::Pragma(pragma) => {
                println!("pragma {} {}", pragma.directive, pragma.arguments.join(" "))
            }
            GrnTestElement::Note(note) => println!("note: {note}"),
            GrnTestElement::Export { name, value } => println!("export {name}={value}"),
            GrnTestElement::Log(log) => println!("log: {log}"),
            GrnTestElement::QueryLog(block) => println!("query log:\n{block}"),
        }
    }
    Ok(())
}

fn parse_file(path: &Path) -> anyhow::Result<Vec<GrnTestElement>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn fixture_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
