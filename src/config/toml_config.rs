use crate::adapters::http::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECONDS};
use crate::config::{parse_delimiter, validate_delimiter, validate_settings};
use crate::core::ConfigProvider;
use crate::domain::model::AddressRole;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub provider: ProviderConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub input: String,
    pub output: String,
    #[serde(default = "default_checkpoint")]
    pub checkpoint: String,
    pub role: AddressRole,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: default_checkpoint_every(),
            delay_seconds: default_delay_seconds(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_checkpoint() -> String {
    "autosave_output.csv".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_checkpoint_every() -> usize {
    10
}

fn default_delay_seconds() -> f64 {
    1.0
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEOCODING_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EnrichError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self, require_api_key: bool) -> Result<()> {
        validate_delimiter("dataset.delimiter", &self.dataset.delimiter)?;
        validate_settings(self, require_api_key)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_key(&self) -> &str {
        &self.provider.api_key
    }

    fn endpoint(&self) -> &str {
        &self.provider.endpoint
    }

    fn timeout_seconds(&self) -> u64 {
        self.provider.timeout_seconds
    }

    fn input_path(&self) -> &str {
        &self.dataset.input
    }

    fn output_path(&self) -> &str {
        &self.dataset.output
    }

    fn checkpoint_path(&self) -> &str {
        &self.dataset.checkpoint
    }

    fn checkpoint_every(&self) -> usize {
        self.run.checkpoint_every
    }

    fn delay_seconds(&self) -> f64 {
        self.run.delay_seconds
    }

    fn role(&self) -> AddressRole {
        self.dataset.role
    }

    fn delimiter(&self) -> u8 {
        parse_delimiter(&self.dataset.delimiter).unwrap_or(b',')
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[provider]
api_key = "abc123"

[dataset]
input = "Missing Billing addresses 2.csv"
output = "GCP_scraped_Billing_Addresses 2.csv"
checkpoint = "autosave_billing_output.csv"
role = "billing"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.api_key(), "abc123");
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_seconds(), 10);
        assert_eq!(config.role(), AddressRole::Billing);
        assert_eq!(config.checkpoint_every(), 10);
        assert_eq!(config.delay_seconds(), 1.0);
        assert_eq!(config.delimiter(), b',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[provider]
api_key = "abc123"
endpoint = "http://localhost:8080/geocode/json"
timeout_seconds = 3

[dataset]
input = "sites.tsv"
output = "sites_enriched.tsv"
role = "shipping"
delimiter = "tab"

[run]
checkpoint_every = 25
delay_seconds = 0.2
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.endpoint(), "http://localhost:8080/geocode/json");
        assert_eq!(config.timeout_seconds(), 3);
        assert_eq!(config.role(), AddressRole::Shipping);
        assert_eq!(config.delimiter(), b'\t');
        assert_eq!(config.checkpoint_every(), 25);
        assert_eq!(config.delay_seconds(), 0.2);
        assert_eq!(config.checkpoint_path(), "autosave_output.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ADDR_BACKFILL_TEST_KEY", "from-env");

        let config =
            TomlConfig::from_toml_str(&BASIC.replace("abc123", "${ADDR_BACKFILL_TEST_KEY}")).unwrap();
        assert_eq!(config.api_key(), "from-env");

        std::env::remove_var("ADDR_BACKFILL_TEST_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let config =
            TomlConfig::from_toml_str(&BASIC.replace("abc123", "${ADDR_BACKFILL_UNSET_KEY}")).unwrap();

        assert_eq!(config.api_key(), "${ADDR_BACKFILL_UNSET_KEY}");
        assert!(config.validate().is_err());
        assert!(config.validate_config(false).is_ok());
    }

    #[test]
    fn test_unknown_role_is_parse_error() {
        let result = TomlConfig::from_toml_str(&BASIC.replace("\"billing\"", "\"site\""));
        assert!(matches!(
            result,
            Err(EnrichError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "Missing Billing addresses 2.csv");
    }
}
