mod decl;

use anyhow::{Context, Result};
use argcraft::{ErrorKind, ParseError, Registry, help};
use clap::{Parser, Subcommand};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::decl::Declaration;

/// Exit status for argument-vector failures (unknown tokens, arity, constraints).
const EXIT_PARSE_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "argcraft")]
#[command(version, about = "Parse argument vectors against a JSON declaration", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an argument vector and print the result as JSON
    Parse(ParseArgs),

    /// Render help text for a declaration
    Help(HelpArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the JSON declaration file
    #[arg(short, long, value_name = "FILE")]
    spec: PathBuf,

    /// Dotenv file layered over the environment
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Ignore the process environment
    #[arg(long)]
    no_process_env: bool,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Arguments to parse (program name is taken from the declaration)
    #[arg(last = true, value_name = "ARGS")]
    argv: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the JSON declaration file
    #[arg(short, long, value_name = "FILE")]
    spec: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Help(args) => help_command(args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn parse_command(args: ParseArgs) -> Result<ExitCode> {
    let decl = Declaration::from_file(&args.spec)?;
    let registry = decl.registry()?;
    let env = load_environment(args.env_file.as_deref(), !args.no_process_env)?;

    let mut argv = Vec::with_capacity(args.argv.len() + 1);
    argv.push(decl.name.clone());
    argv.extend(args.argv);
    tracing::debug!(args = argv.len() - 1, "parsing argument vector");

    let matches = match registry.parse_with_env(&argv, &env) {
        Ok(matches) => matches,
        Err(err) => {
            report_parse_error(&err, &registry, &decl);
            return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
        }
    };

    let json = if args.compact {
        serde_json::to_string(&matches)?
    } else {
        serde_json::to_string_pretty(&matches)?
    };
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn help_command(args: HelpArgs) -> Result<ExitCode> {
    let decl = Declaration::from_file(&args.spec)?;
    let registry = decl.registry()?;
    print!("{}", help::render(&registry, &decl.help_meta()));
    Ok(ExitCode::SUCCESS)
}

fn report_parse_error(err: &ParseError, registry: &Registry, decl: &Declaration) {
    let request = err.help_request();
    tracing::debug!(kind = ?request.kind, subject = ?request.subject, "parse failed");

    if err.is_fatal() {
        eprintln!("error: {err}");
    } else {
        for violation in err.violations() {
            eprintln!("error: {violation}");
        }
    }

    if matches!(
        request.kind,
        ErrorKind::UnknownArgument | ErrorKind::MissingPositional
    ) {
        eprintln!();
        eprint!("{}", help::render(registry, &decl.help_meta()));
    }
}

/// Process environment (unless disabled) with dotenv pairs layered on top.
fn load_environment(
    env_file: Option<&Path>,
    process: bool,
) -> Result<HashMap<String, String>> {
    let mut env: HashMap<String, String> = if process {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    } else {
        HashMap::new()
    };

    if let Some(path) = env_file {
        let iter = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to read env file: {}", path.display()))?;
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("failed to parse env file: {}", path.display()))?;
            env.insert(key, value);
        }
    }

    Ok(env)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
