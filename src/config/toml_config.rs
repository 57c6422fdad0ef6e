use crate::app::grid::Theme;
use crate::core::apportionment::NegativeVotes;
use crate::domain::model::{
    DEFAULT_DIVISOR_CEILING, DEFAULT_ELECTION_NAME, DEFAULT_PARTY_SLOTS, DEFAULT_SEATS,
    MAX_DIVISOR_CEILING, MAX_PARTY_SLOTS, MAX_SEATS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DhondtError, Result};
use crate::utils::validation::{validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_PRECISION: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub session: SessionConfig,
    pub engine: EngineConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub election_name: String,
    pub party_slots: usize,
    pub divisor_ceiling: u32,
    pub seats: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            election_name: DEFAULT_ELECTION_NAME.to_string(),
            party_slots: DEFAULT_PARTY_SLOTS,
            divisor_ceiling: DEFAULT_DIVISOR_CEILING,
            seats: DEFAULT_SEATS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub negative_votes: NegativeVotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: Theme,
    pub precision: usize,
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            precision: 1,
            color: true,
        }
    }
}

impl CalculatorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DhondtError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DhondtError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ELECTION_NAME})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DhondtError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_range(
            "session.party_slots",
            self.session.party_slots,
            1,
            MAX_PARTY_SLOTS,
        )?;
        validate_range(
            "session.divisor_ceiling",
            self.session.divisor_ceiling,
            1,
            MAX_DIVISOR_CEILING,
        )?;
        validate_range("session.seats", self.session.seats, 0, MAX_SEATS)?;
        validate_range("display.precision", self.display.precision, 0, MAX_PRECISION)?;
        Ok(())
    }
}

impl ConfigProvider for CalculatorConfig {
    fn election_name(&self) -> &str {
        &self.session.election_name
    }

    fn party_slots(&self) -> usize {
        self.session.party_slots
    }

    fn divisor_ceiling(&self) -> u32 {
        self.session.divisor_ceiling
    }

    fn seats(&self) -> u32 {
        self.session.seats
    }
}

impl Validate for CalculatorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CalculatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, CalculatorConfig::default());
        assert_eq!(config.party_slots(), 12);
        assert_eq!(config.divisor_ceiling(), 20);
        assert_eq!(config.seats(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[session]
election_name = "Municipal 2024"
party_slots = 6
divisor_ceiling = 10
seats = 25

[engine]
negative_votes = "clamp"

[display]
theme = "dark"
precision = 2
color = false
"#;

        let config = CalculatorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.election_name(), "Municipal 2024");
        assert_eq!(config.party_slots(), 6);
        assert_eq!(config.divisor_ceiling(), 10);
        assert_eq!(config.seats(), 25);
        assert_eq!(config.engine.negative_votes, NegativeVotes::Clamp);
        assert_eq!(config.display.theme, Theme::Dark);
        assert_eq!(config.display.precision, 2);
        assert!(!config.display.color);

        let session = config.initial_session();
        assert_eq!(session.party_slots(), 6);
        assert_eq!(session.seats, 25);
        assert_eq!(session.election_name, "Municipal 2024");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DHONDT_TEST_ELECTION", "Regional Assembly");

        let toml_content = r#"
[session]
election_name = "${DHONDT_TEST_ELECTION}"
"#;

        let config = CalculatorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.session.election_name, "Regional Assembly");

        std::env::remove_var("DHONDT_TEST_ELECTION");
    }

    #[test]
    fn test_config_validation() {
        let config = CalculatorConfig::from_toml_str("[session]\ndivisor_ceiling = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = CalculatorConfig::from_toml_str("[session]\nseats = 1001\n").unwrap();
        assert!(config.validate().is_err());

        let config = CalculatorConfig::from_toml_str("[display]\nprecision = 9\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = CalculatorConfig::from_toml_str("[session\nseats = 3").unwrap_err();
        assert!(matches!(err, DhondtError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[session]\nelection_name = \"file-test\"\n")
            .unwrap();

        let config = CalculatorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.session.election_name, "file-test");
    }
}
