//! Weft CLI - command line interface for the weft DI analyzer

mod config;

use std::{
    fs,
    path::{Path, PathBuf},
    process,
    str::FromStr,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use log::{debug, info, LevelFilter};
use thiserror::Error;

use weft::{analyze, link_files, parse_files, PipelineError, SourceFile};

use crate::config::{load_config, ConfigError, WeftConfig};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Static analyzer for dependency-injection annotations", long_about = None)]
struct Cli {
    /// Path to a configuration file (defaults to ./weft.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only keep declarations available on this platform
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Only keep declarations belonging to this project
    #[arg(long, global = true)]
    project: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the dependency graph of the given files
    Check {
        /// Input files (defaults to the configured inputs)
        files: Vec<PathBuf>,
    },
    /// Link the given files and print the graph as JSON
    Graph {
        /// Input files (defaults to the configured inputs)
        files: Vec<PathBuf>,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the annotation tokens of a file
    Tokens {
        /// Input file
        file: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Error reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No input files")]
    NoInputs,

    #[error("Failed to serialize the graph: {0}")]
    Json(#[from] serde_json::Error),

    /// Already reported to the user
    #[error("Analysis failed")]
    Reported,
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn);
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    if let Err(error) = run(cli) {
        if !matches!(error, CliError::Reported) {
            eprintln!("error: {}", error);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?
        .with_overrides(cli.platform.as_deref(), cli.project.as_deref())?;

    match cli.command {
        Commands::Check { files } => cmd_check(&config, &files),
        Commands::Graph { files, pretty } => cmd_graph(&config, &files, pretty),
        Commands::Tokens { file } => cmd_tokens(&config, &file),
    }
}

fn cmd_check(config: &WeftConfig, paths: &[PathBuf]) -> Result<(), CliError> {
    let sources = read_sources(config, paths)?;
    match analyze(&sources, &config.pipeline()) {
        Ok(analysis) => {
            for warning in &analysis.warnings {
                println!("{}", warning);
            }
            info!(
                files = sources.len(),
                containers = analysis.graph.len(),
                warnings = analysis.warnings.len();
                "Dependency graph is valid"
            );
            Ok(())
        }
        Err(error) => {
            report_error(&error, &sources);
            Err(CliError::Reported)
        }
    }
}

fn cmd_graph(config: &WeftConfig, paths: &[PathBuf], pretty: bool) -> Result<(), CliError> {
    let sources = read_sources(config, paths)?;
    let pipeline = config.pipeline();
    let graph = parse_files(&sources, &pipeline.lexer)
        .and_then(|trees| link_files(trees, &pipeline.linker))
        .map_err(|error| {
            report_error(&error, &sources);
            CliError::Reported
        })?;

    let json = if pretty {
        graph.to_json_pretty()?
    } else {
        graph.to_json()?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_tokens(config: &WeftConfig, path: &Path) -> Result<(), CliError> {
    let source = read_source(path)?;
    let tokens = weft_lexer::tokenize(&source.source, &source.name, &config.pipeline().lexer).map_err(|error| {
        report_error(&PipelineError::Lexer(error), std::slice::from_ref(&source));
        CliError::Reported
    })?;

    for token in &tokens {
        println!("{}", token);
    }
    Ok(())
}

fn read_sources(config: &WeftConfig, paths: &[PathBuf]) -> Result<Vec<SourceFile>, CliError> {
    let paths = if paths.is_empty() { &config.inputs[..] } else { paths };
    if paths.is_empty() {
        return Err(CliError::NoInputs);
    }
    debug!(files = paths.len(); "Reading input files");
    paths.iter().map(|path| read_source(path)).collect()
}

fn read_source(path: &Path) -> Result<SourceFile, CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::new(path.display().to_string(), source))
}

/// Print the diagnostic lines, then a source excerpt when the error points
/// into a file we have in memory.
fn report_error(error: &PipelineError, sources: &[SourceFile]) {
    eprintln!("{}", error.to_diagnostic());

    let location = error.location();
    let (Some(range), Some(file)) = (error.byte_range(), location.file.as_deref()) else {
        return;
    };
    let Some(source) = sources.iter().find(|source| source.name == file) else {
        return;
    };

    let range = range.start.min(source.source.len())..range.end.min(source.source.len());
    let report = Report::build(ReportKind::Error, file, range.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((file, range))
                .with_message(error.to_diagnostic().message)
                .with_color(Color::Red),
        )
        .finish();
    if let Err(e) = report.eprint((file, Source::from(source.source.as_str()))) {
        debug!(error:% = e; "Failed to render source excerpt");
    }
}
