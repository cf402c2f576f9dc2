//! Optional TOML configuration.
//!
//! ```toml
//! [parser]
//! title = "Store"
//! version = "2.0.0"
//!
//! [parser.scalars]
//! DateTime = "datetime"
//! Money = "number"
//! ```

use std::fs;
use std::path::Path;

use apir_core::ParserOptions;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    parser: ParserOptions,
}

/// Load parser options from `path`, or the defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<ParserOptions, String> {
    let Some(path) = path else {
        return Ok(ParserOptions::default());
    };
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config file {}: {err}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .map_err(|err| format!("Failed to parse config file {}: {err}", path.display()))?;
    debug!(
        path = %path.display(),
        scalars = config.parser.scalars.len(),
        "Loaded config file."
    );
    Ok(config.parser)
}
