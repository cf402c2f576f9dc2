//! `apir`: parse and validate API descriptions from the command line.
//!
//! ```text
//! apir parse petstore.yaml > petstore.ir.json
//! apir validate schema.graphql --config apir.toml
//! ```
//!
//! Logging goes to stderr and is controlled by `APIR_LOG`.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "apir",
    version,
    about = "Normalize OpenAPI and GraphQL documents into one typed IR"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print its IR as JSON
    Parse(commands::parse::ParseArgs),
    /// Parse a document and report validation findings
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let code = run(std::env::args().collect());
    std::process::exit(code);
}

fn run(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => {
            init_tracing();
            match cli.command {
                Some(Commands::Parse(args)) => commands::parse::run(args),
                Some(Commands::Validate(args)) => commands::validate::run(args),
                None => {
                    let mut cmd = Cli::command();
                    let _ = cmd.print_help();
                    println!();
                    0
                }
            }
        }
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Crates whose events a plain `APIR_LOG` level applies to.
const LOG_TARGETS: [&str; 2] = ["apir", "apir_core"];

fn init_tracing() {
    let filter = log_filter(std::env::var("APIR_LOG").ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// `APIR_LOG` is either a plain level ("trace", "debug", "info", "warn",
/// "error") scoped to our crates, or a full filter spec like
/// "apir_core=trace,apir=warn".
fn log_filter(value: Option<&str>) -> String {
    let scoped = |level: &str| {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    };
    match value {
        Some(level) if is_plain_level(level) => scoped(&level.to_ascii_lowercase()),
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => scoped("info"),
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(None), "apir=info,apir_core=info");
        assert_eq!(log_filter(Some("DEBUG")), "apir=debug,apir_core=debug");
        assert_eq!(log_filter(Some("apir_core=trace")), "apir_core=trace");
        assert_eq!(log_filter(Some("  ")), "apir=info,apir_core=info");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["apir", "validate", "api.yaml", "--config", "apir.toml", "--json"])
            .unwrap();
        let Some(Commands::Validate(args)) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.source.file.to_str(), Some("api.yaml"));
        assert_eq!(args.source.config.as_deref().and_then(|p| p.to_str()), Some("apir.toml"));
        assert!(args.json);
    }

    #[test]
    fn test_usage_error_exit_code() {
        assert_eq!(run(vec!["apir".to_string(), "bogus".to_string()]), 2);
    }
}
