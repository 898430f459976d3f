/// CLI configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tonechain_core::PipelineConfig;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "tonechain.toml";

/// Prefix of environment overrides, e.g. `TONECHAIN_PIPELINE__INPUT_PATH`
const ENV_PREFIX: &str = "TONECHAIN";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    pub pipeline: PipelineConfig,
    pub debug: DebugSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Write `pipeline.dot` (and a PDF when `dot` is installed) before each run
    pub export_graph: bool,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `tonechain.toml` is read if
    /// it is there. Environment variables override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = ::config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(::config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(::config::File::from(default_path));
                }
            }
        }

        // Nested keys use a double underscore: TONECHAIN_PIPELINE__ECHO__ENABLED
        settings = settings.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build().context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Validate configuration before a run
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.input_path.as_os_str().is_empty() {
            bail!("Input file is required (use --input or set pipeline.input_path)");
        }
        if self.pipeline.output_path.as_os_str().is_empty() {
            bail!("Output file is required (use --output or set pipeline.output_path)");
        }
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
