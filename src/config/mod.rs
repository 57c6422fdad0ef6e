pub mod cli;
pub mod toml_config;

use crate::app::export::OutputFormat;
use crate::app::grid::Theme;
use crate::core::apportionment::NegativeVotes;
use crate::domain::model::{MAX_DIVISOR_CEILING, MAX_PARTY_SLOTS};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DhondtError, Result};
use crate::utils::validation::{validate_non_negative, validate_path, validate_range, Validate};
use serde::{Deserialize, Serialize};
use self::toml_config::CalculatorConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "dhondt-calc"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Allocate seats with the D'Hondt method and show the quotient grid")
)]
pub struct CliConfig {
    /// Election record to load (CSV)
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub input: Option<String>,

    /// Path to TOML configuration file
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub config: Option<String>,

    /// Override the election name
    #[cfg_attr(feature = "cli", arg(long))]
    pub name: Option<String>,

    /// Seats to distribute
    #[cfg_attr(feature = "cli", arg(long, allow_negative_numbers = true))]
    pub seats: Option<i64>,

    /// Number of party slots
    #[cfg_attr(feature = "cli", arg(long))]
    pub parties: Option<usize>,

    /// Divisor ceiling (divisors 1..=N per party)
    #[cfg_attr(feature = "cli", arg(long))]
    pub divisors: Option<u32>,

    /// Set a party as NAME=VOTES; repeated flags fill slots in order
    #[cfg_attr(feature = "cli", arg(long = "vote", value_name = "NAME=VOTES"))]
    pub votes: Vec<String>,

    /// Sort parties by votes before allocating
    #[cfg_attr(feature = "cli", arg(long))]
    pub sort: bool,

    #[cfg_attr(feature = "cli", arg(long, value_enum, default_value_t = OutputFormat::Table))]
    pub format: OutputFormat,

    #[cfg_attr(feature = "cli", arg(long, value_enum))]
    pub theme: Option<Theme>,

    /// Mark cells with * and + instead of colours
    #[cfg_attr(feature = "cli", arg(long))]
    pub no_color: bool,

    /// Write the (possibly edited) election record to this path
    #[cfg_attr(feature = "cli", arg(long))]
    pub save: Option<String>,

    /// Fail instead of defaulting malformed record fields
    #[cfg_attr(feature = "cli", arg(long))]
    pub strict: bool,

    /// Treat negative votes and seats as 0 instead of rejecting them
    #[cfg_attr(feature = "cli", arg(long))]
    pub clamp_negative: bool,

    #[cfg_attr(feature = "cli", arg(short, long, help = "Enable verbose output"))]
    pub verbose: bool,

    /// Emit logs as JSON
    #[cfg_attr(feature = "cli", arg(long))]
    pub log_json: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            validate_path("input", input)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        if let Some(save) = &self.save {
            validate_path("save", save)?;
        }
        if let Some(parties) = self.parties {
            validate_range("parties", parties, 1, MAX_PARTY_SLOTS)?;
        }
        if let Some(divisors) = self.divisors {
            validate_range("divisors", divisors, 1, MAX_DIVISOR_CEILING)?;
        }
        for spec in &self.votes {
            parse_vote_spec(spec)?;
        }
        Ok(())
    }
}

/// `NAME=VOTES`，以最後一個 `=` 分隔，名稱可以包含 `=`
pub fn parse_vote_spec(spec: &str) -> Result<(String, i64)> {
    let (name, votes) = spec.rsplit_once('=').ok_or_else(|| DhondtError::InvalidConfigValueError {
        field: "vote".to_string(),
        value: spec.to_string(),
        reason: "Expected NAME=VOTES".to_string(),
    })?;
    let votes = votes
        .trim()
        .parse::<i64>()
        .map_err(|e| DhondtError::InvalidConfigValueError {
            field: "vote".to_string(),
            value: spec.to_string(),
            reason: format!("Votes must be an integer: {}", e),
        })?;
    Ok((name.trim().to_string(), votes))
}

/// Effective settings: built-in defaults, then the TOML file, then CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub election_name: String,
    pub party_slots: usize,
    pub divisor_ceiling: u32,
    pub seats: u32,
    pub negative_votes: NegativeVotes,
    pub theme: Theme,
    pub precision: usize,
    pub color: bool,
}

impl Settings {
    pub fn from_file_config(file: &CalculatorConfig) -> Self {
        Self {
            election_name: file.session.election_name.clone(),
            party_slots: file.session.party_slots,
            divisor_ceiling: file.session.divisor_ceiling,
            seats: file.session.seats,
            negative_votes: file.engine.negative_votes,
            theme: file.display.theme,
            precision: file.display.precision,
            color: file.display.color,
        }
    }

    /// 合併 CLI 覆蓋設定。座位數為負時依 negative_votes 模式拒絕或歸零
    pub fn resolve(cli: &CliConfig, file: Option<&CalculatorConfig>) -> Result<Self> {
        let defaults = CalculatorConfig::default();
        let mut settings = Self::from_file_config(file.unwrap_or(&defaults));

        if cli.clamp_negative {
            settings.negative_votes = NegativeVotes::Clamp;
        }
        if let Some(name) = &cli.name {
            settings.election_name = name.clone();
        }
        if let Some(parties) = cli.parties {
            settings.party_slots = parties;
        }
        if let Some(divisors) = cli.divisors {
            settings.divisor_ceiling = divisors;
        }
        if let Some(seats) = cli.seats {
            settings.seats = settings.checked_seats(seats)?;
        }
        if let Some(theme) = cli.theme {
            settings.theme = theme;
        }
        if cli.no_color {
            settings.color = false;
        }
        Ok(settings)
    }

    pub fn checked_seats(&self, seats: i64) -> Result<u32> {
        if self.negative_votes == NegativeVotes::Reject {
            validate_non_negative("seats", seats)?;
        }
        Ok(crate::domain::model::clamp_seats(seats))
    }

    pub fn checked_votes(&self, field: &str, votes: i64) -> Result<i64> {
        if self.negative_votes == NegativeVotes::Reject {
            validate_non_negative(field, votes)?;
        }
        Ok(votes.max(0))
    }
}

impl ConfigProvider for Settings {
    fn election_name(&self) -> &str {
        &self.election_name
    }

    fn party_slots(&self) -> usize {
        self.party_slots
    }

    fn divisor_ceiling(&self) -> u32 {
        self.divisor_ceiling
    }

    fn seats(&self) -> u32 {
        self.seats
    }
}
