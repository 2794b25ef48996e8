use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cotiza_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let budget = &config.budget;
    let fixture_path = config
        .data
        .fixture_path
        .as_ref()
        .map_or_else(|| "<built-in demo>".to_string(), |path| path.display().to_string());

    let fields = [
        (
            "budget.lead_business_days",
            budget.lead_business_days.to_string(),
            &["COTIZA_BUDGET_LEAD_BUSINESS_DAYS"][..],
        ),
        (
            "budget.pump_minimum_volume",
            budget.pump_minimum_volume.to_string(),
            &["COTIZA_BUDGET_PUMP_MINIMUM_VOLUME"][..],
        ),
        (
            "budget.volume_tolerance",
            budget.volume_tolerance.to_string(),
            &["COTIZA_BUDGET_VOLUME_TOLERANCE"][..],
        ),
        (
            "budget.default_work_type",
            budget.default_work_type.clone(),
            &["COTIZA_BUDGET_DEFAULT_WORK_TYPE"][..],
        ),
        (
            "budget.default_category",
            budget.default_category.clone(),
            &["COTIZA_BUDGET_DEFAULT_CATEGORY"][..],
        ),
        (
            "budget.default_resistance",
            budget.default_resistance.clone(),
            &["COTIZA_BUDGET_DEFAULT_RESISTANCE"][..],
        ),
        (
            "budget.pavement_resistance",
            budget.pavement_resistance.clone(),
            &["COTIZA_BUDGET_PAVEMENT_RESISTANCE"][..],
        ),
        ("data.fixture_path", fixture_path, &["COTIZA_DATA_FIXTURE_PATH"][..]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["COTIZA_LOGGING_LEVEL", "COTIZA_LOG_LEVEL"][..],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["COTIZA_LOGGING_FORMAT", "COTIZA_LOG_FORMAT"][..],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields
            .iter()
            .map(|&(key, ref value, env_keys)| render_line(key, value, source(key, env_keys))),
    );

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    ["cotiza.toml", "config/cotiza.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
