//! `apir parse`: print the IR of a document as JSON.

use std::io::{self, Write};

use clap::Args;
use tracing::info;

use super::{SourceArgs, exit_code};

/// Arguments of `apir parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Print single-line JSON instead of pretty-printed output
    #[arg(long)]
    pub compact: bool,
}

/// Run the command, returning the process exit code.
pub fn run(args: ParseArgs) -> i32 {
    exit_code(run_inner(&args, &mut io::stdout().lock()))
}

fn run_inner(args: &ParseArgs, out: &mut impl Write) -> Result<i32, String> {
    let schema = args.source.load()?;
    info!(
        path = %args.source.file.display(),
        types = schema.types.len(),
        endpoints = schema.endpoints.len(),
        operations = schema.operations.len(),
        "Parsed document."
    );

    let json = if args.compact {
        serde_json::to_string(&schema)
    } else {
        serde_json::to_string_pretty(&schema)
    }
    .map_err(|err| format!("Failed to serialize IR: {err}"))?;
    writeln!(out, "{json}").map_err(|err| format!("Failed to write output: {err}"))?;
    Ok(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn args(file: &Path, compact: bool) -> ParseArgs {
        ParseArgs {
            source: SourceArgs {
                file: file.to_path_buf(),
                config: None,
            },
            compact,
        }
    }

    #[test]
    fn test_prints_ir_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.graphql");
        fs::write(&path, "type Query { ping: String }").unwrap();

        let mut out = Vec::new();
        assert_eq!(run_inner(&args(&path, true), &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["metadata"]["title"], "shop");
        assert_eq!(json["operations"][0]["name"], "ping");
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.yaml");
        fs::write(&path, "swagger: '2.0'\ninfo: {title: Old, version: '1'}\npaths: {}\n").unwrap();

        let err = run_inner(&args(&path, false), &mut Vec::new()).unwrap_err();
        assert!(err.contains("2.0"));
        assert_eq!(run(args(&path, false)), 1);
    }
}
