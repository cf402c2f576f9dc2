//! Subcommands and the arguments they share.

pub mod parse;
pub mod validate;

use std::path::PathBuf;

use apir_core::{IrSchema, parse_file};
use clap::Args;

use crate::config;

/// Input document plus optional configuration, shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Document to read (.json, .yaml, .yml, .graphql, .graphqls, .gql)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// TOML file with a [parser] table
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// Load configuration, then parse the document.
    pub fn load(&self) -> Result<IrSchema, String> {
        let options = config::load(self.config.as_deref())?;
        parse_file(&self.file, &options).map_err(|err| err.to_string())
    }
}

/// Map a command body's result to an exit code, printing failures to stderr.
pub fn exit_code(result: Result<i32, String>) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
