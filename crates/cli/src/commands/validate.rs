//! `apir validate`: report validation findings for a document.

use std::io::{self, Write};

use apir_core::validate;
use clap::Args;
use tracing::info;

use super::{SourceArgs, exit_code};

/// Exit code for a document that parsed but failed validation.
const INVALID: i32 = 2;

/// Arguments of `apir validate`.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Print the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the command, returning the process exit code.
pub fn run(args: ValidateArgs) -> i32 {
    exit_code(run_inner(&args, &mut io::stdout().lock()))
}

fn run_inner(args: &ValidateArgs, out: &mut impl Write) -> Result<i32, String> {
    let schema = args.source.load()?;
    let result = validate(&schema);
    info!(
        path = %args.source.file.display(),
        valid = result.valid,
        errors = result.errors.len(),
        "Validated document."
    );

    let write_err = |err: io::Error| format!("Failed to write output: {err}");
    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|err| format!("Failed to serialize validation result: {err}"))?;
        writeln!(out, "{json}").map_err(write_err)?;
    } else if result.valid {
        writeln!(out, "{}: valid", args.source.file.display()).map_err(write_err)?;
    } else {
        for error in &result.errors {
            writeln!(out, "{}: {}", error.path, error.message).map_err(write_err)?;
        }
        writeln!(
            out,
            "{}: {} problem(s) found",
            args.source.file.display(),
            result.errors.len()
        )
        .map_err(write_err)?;
    }

    Ok(if result.valid { 0 } else { INVALID })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn args(file: &Path, json: bool) -> ValidateArgs {
        ValidateArgs {
            source: SourceArgs {
                file: file.to_path_buf(),
                config: None,
            },
            json,
        }
    }

    const DANGLING: &str = r#"
openapi: 3.0.0
info: {title: Owners, version: 1.0.0}
paths: {}
components:
  schemas:
    Owner:
      type: object
      properties:
        pet: {$ref: '#/components/schemas/Pet'}
"#;

    #[test]
    fn test_valid_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ok.graphql", "type Query { ping: String! }");
        let mut out = Vec::new();
        assert_eq!(run_inner(&args(&path, false), &mut out).unwrap(), 0);
        assert!(String::from_utf8(out).unwrap().ends_with(": valid\n"));
    }

    #[test]
    fn test_findings_exit_non_zero() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "owners.yaml", DANGLING);
        let mut out = Vec::new();
        assert_eq!(run_inner(&args(&path, false), &mut out).unwrap(), INVALID);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("types.Owner.properties[0].type.name: Referenced type \"Pet\" not found"));
        assert!(text.contains("1 problem(s) found"));
    }

    #[test]
    fn test_json_output() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "owners.yaml", DANGLING);
        let mut out = Vec::new();
        run_inner(&args(&path, true), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0]["path"], "types.Owner.properties[0].type.name");
    }

    #[test]
    fn test_config_applies() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "api.graphql", "scalar Money\ntype Query { price: Money }");
        let config = write(&dir, "apir.toml", "[parser.scalars]\nMoney = \"number\"\n");
        let args = ValidateArgs {
            source: SourceArgs {
                file: path,
                config: Some(config),
            },
            json: false,
        };
        let schema = args.source.load().unwrap();
        assert_eq!(schema.get_type("Money").unwrap().kind_name(), "number");
        assert_eq!(run_inner(&args, &mut Vec::new()).unwrap(), 0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = run_inner(&args(&dir.path().join("nope.yaml"), false), &mut Vec::new())
            .unwrap_err();
        assert!(err.contains("nope.yaml"));
    }
}
