use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub budget: BudgetRules,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// Business constants of the budget builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetRules {
    pub lead_business_days: u32,
    pub pump_minimum_volume: Decimal,
    pub volume_tolerance: Decimal,
    pub default_work_type: String,
    pub default_category: String,
    pub default_resistance: String,
    pub pavement_resistance: String,
}

#[derive(Clone, Debug, Default)]
pub struct DataConfig {
    pub fixture_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub fixture_path: Option<PathBuf>,
    pub lead_business_days: Option<u32>,
    pub pump_minimum_volume: Option<Decimal>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for BudgetRules {
    fn default() -> Self {
        Self {
            lead_business_days: 7,
            pump_minimum_volume: Decimal::TEN,
            volume_tolerance: Decimal::new(1, 1),
            default_work_type: "vivienda".to_string(),
            default_category: "convencional".to_string(),
            default_resistance: "150".to_string(),
            pavement_resistance: "MR 40".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            budget: BudgetRules::default(),
            data: DataConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cotiza.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(budget) = patch.budget {
            if let Some(lead_business_days) = budget.lead_business_days {
                self.budget.lead_business_days = lead_business_days;
            }
            if let Some(pump_minimum_volume) = budget.pump_minimum_volume {
                self.budget.pump_minimum_volume = pump_minimum_volume;
            }
            if let Some(volume_tolerance) = budget.volume_tolerance {
                self.budget.volume_tolerance = volume_tolerance;
            }
            if let Some(default_work_type) = budget.default_work_type {
                self.budget.default_work_type = default_work_type;
            }
            if let Some(default_category) = budget.default_category {
                self.budget.default_category = default_category;
            }
            if let Some(default_resistance) = budget.default_resistance {
                self.budget.default_resistance = default_resistance;
            }
            if let Some(pavement_resistance) = budget.pavement_resistance {
                self.budget.pavement_resistance = pavement_resistance;
            }
        }

        if let Some(data) = patch.data {
            if let Some(fixture_path) = data.fixture_path {
                self.data.fixture_path = Some(fixture_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("COTIZA_BUDGET_LEAD_BUSINESS_DAYS") {
            self.budget.lead_business_days = parse_u32("COTIZA_BUDGET_LEAD_BUSINESS_DAYS", &value)?;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_PUMP_MINIMUM_VOLUME") {
            self.budget.pump_minimum_volume =
                parse_decimal("COTIZA_BUDGET_PUMP_MINIMUM_VOLUME", &value)?;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_VOLUME_TOLERANCE") {
            self.budget.volume_tolerance = parse_decimal("COTIZA_BUDGET_VOLUME_TOLERANCE", &value)?;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_DEFAULT_WORK_TYPE") {
            self.budget.default_work_type = value;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_DEFAULT_CATEGORY") {
            self.budget.default_category = value;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_DEFAULT_RESISTANCE") {
            self.budget.default_resistance = value;
        }
        if let Some(value) = read_env("COTIZA_BUDGET_PAVEMENT_RESISTANCE") {
            self.budget.pavement_resistance = value;
        }

        if let Some(value) = read_env("COTIZA_DATA_FIXTURE_PATH") {
            self.data.fixture_path = Some(PathBuf::from(value));
        }

        let log_level = read_env("COTIZA_LOGGING_LEVEL").or_else(|| read_env("COTIZA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COTIZA_LOGGING_FORMAT").or_else(|| read_env("COTIZA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(fixture_path) = overrides.fixture_path {
            self.data.fixture_path = Some(fixture_path);
        }
        if let Some(lead_business_days) = overrides.lead_business_days {
            self.budget.lead_business_days = lead_business_days;
        }
        if let Some(pump_minimum_volume) = overrides.pump_minimum_volume {
            self.budget.pump_minimum_volume = pump_minimum_volume;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_budget(&self.budget)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_budget(budget: &BudgetRules) -> Result<(), ConfigError> {
    if budget.lead_business_days == 0 || budget.lead_business_days > 60 {
        return Err(ConfigError::Validation(
            "budget.lead_business_days must be in range 1..=60".to_string(),
        ));
    }

    if budget.pump_minimum_volume < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "budget.pump_minimum_volume must not be negative".to_string(),
        ));
    }

    if budget.volume_tolerance < Decimal::ZERO || budget.volume_tolerance >= Decimal::ONE {
        return Err(ConfigError::Validation(
            "budget.volume_tolerance must be in range 0..1 (cubic meters)".to_string(),
        ));
    }

    let blank = [
        ("budget.default_category", &budget.default_category),
        ("budget.default_resistance", &budget.default_resistance),
        ("budget.pavement_resistance", &budget.pavement_resistance),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    if let Some((key, _)) = blank {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    budget: Option<BudgetPatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BudgetPatch {
    lead_business_days: Option<u32>,
    pump_minimum_volume: Option<Decimal>,
    volume_tolerance: Option<Decimal>,
    default_work_type: Option<String>,
    default_category: Option<String>,
    default_resistance: Option<String>,
    pavement_resistance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    fixture_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
