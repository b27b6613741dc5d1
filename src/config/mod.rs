pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url,
};

#[cfg(feature = "cli")]
use crate::adapters::http::DEFAULT_ENDPOINT;
#[cfg(feature = "cli")]
use crate::domain::model::AddressRole;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

const DATASET_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// `","`, `";"`, `"|"`, `"tab"` or `"\t"`. Any other single ASCII character is accepted too.
pub fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Some(b'\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => {
                    Some(c as u8)
                }
                _ => None,
            }
        }
    }
}

pub(crate) fn validate_delimiter(field_name: &str, raw: &str) -> Result<()> {
    match parse_delimiter(raw) {
        Some(_) => Ok(()),
        None => Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Delimiter must be a single ASCII character or 'tab'".to_string(),
        }),
    }
}

/// Checks shared by every configuration source. The API key is only needed when
/// lookups will actually be sent.
pub fn validate_settings<C: ConfigProvider>(config: &C, require_api_key: bool) -> Result<()> {
    if require_api_key {
        let key = config.api_key();
        if key.trim().is_empty() {
            return Err(EnrichError::MissingConfigError {
                field: "api_key".to_string(),
            });
        }
        if key.contains("${") {
            return Err(EnrichError::ConfigValidationError {
                field: "api_key".to_string(),
                message: "environment variable referenced by api_key is not set".to_string(),
            });
        }
    }

    validate_url("endpoint", config.endpoint())?;
    validate_range("timeout_seconds", config.timeout_seconds(), 1, 300)?;

    validate_path("input", config.input_path())?;
    validate_file_extension("input", config.input_path(), &DATASET_EXTENSIONS)?;
    validate_path("output", config.output_path())?;
    validate_non_empty_string("checkpoint", config.checkpoint_path())?;

    if config.output_path() == config.input_path() {
        return Err(EnrichError::ConfigValidationError {
            field: "output".to_string(),
            message: "output must differ from input so the source dataset is kept".to_string(),
        });
    }
    if config.checkpoint_path() == config.output_path()
        || config.checkpoint_path() == config.input_path()
    {
        return Err(EnrichError::ConfigValidationError {
            field: "checkpoint".to_string(),
            message: "checkpoint must differ from input and output".to_string(),
        });
    }

    validate_positive_number("checkpoint_every", config.checkpoint_every(), 1)?;
    validate_range("delay_seconds", config.delay_seconds(), 0.0, 3600.0)?;

    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "addr-backfill")]
#[command(about = "Backfill missing billing or shipping address fields from a geocoding service")]
pub struct CliConfig {
    #[arg(long, env = "GEOCODING_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    #[arg(short, long, help = "Dataset to enrich")]
    pub input: String,

    #[arg(short, long, help = "Where the enriched dataset is written")]
    pub output: String,

    #[arg(long, default_value = "autosave_output.csv")]
    pub checkpoint: String,

    #[arg(long, default_value = "10", help = "Checkpoint after lookups on every Nth row")]
    pub checkpoint_every: usize,

    #[arg(long, default_value = "1.0", help = "Seconds to wait after each lookup")]
    pub delay_seconds: f64,

    #[arg(long, value_enum, default_value = "billing")]
    pub role: AddressRole,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = ",", help = "Field delimiter: a single character or 'tab'")]
    pub delimiter: String,

    #[arg(long, help = "List the queries that would be sent, without calling the provider")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn checkpoint_path(&self) -> &str {
        &self.checkpoint
    }

    fn checkpoint_every(&self) -> usize {
        self.checkpoint_every
    }

    fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    fn role(&self) -> AddressRole {
        self.role
    }

    fn delimiter(&self) -> u8 {
        parse_delimiter(&self.delimiter).unwrap_or(b',')
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_delimiter("delimiter", &self.delimiter)?;
        validate_settings(self, !self.dry_run)
    }
}
