//! Runtime settings: built-in defaults, then an optional `design_blocks.toml`
//! (or .json/.yaml) in the working directory, then `DESIGN_BLOCKS_*`
//! environment variables with `__` between nested keys, e.g.
//! `DESIGN_BLOCKS_MULTIPLICITY__FINDINGS=all`.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::parser::ExtractOptions;

pub const CONFIG_FILE: &str = "design_blocks";
pub const ENV_PREFIX: &str = "DESIGN_BLOCKS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: OutputFormat,
    pub multiplicity: ExtractOptions,
}

pub fn load() -> Result<Settings> {
    load_from(CONFIG_FILE)
}

/// `file` is a path without extension; a missing file is not an error.
pub fn load_from(file: &str) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(settings.try_deserialize()?)
}
