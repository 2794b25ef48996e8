use chrono::{Local, NaiveDate, NaiveTime};
use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_core::compute_expiration;
use serde::Serialize;

use crate::commands::{render_report, CommandResult};

#[derive(Debug, Serialize)]
struct ExpirationReport {
    from: NaiveDate,
    lead_business_days: u32,
    valid_until: NaiveDate,
}

pub fn run(from: Option<NaiveDate>, days: Option<u32>) -> CommandResult {
    let lead_business_days = match days {
        Some(days) => days,
        None => match AppConfig::load(LoadOptions::default()) {
            Ok(config) => config.budget.lead_business_days,
            Err(error) => {
                return CommandResult::failure(
                    "expiration",
                    "config_validation",
                    format!("config validation failed: {error}"),
                    2,
                )
            }
        },
    };
    if lead_business_days == 0 {
        return CommandResult::failure(
            "expiration",
            "invalid_input",
            "lead time must be at least one business day",
            4,
        );
    }

    let from = from.unwrap_or_else(|| Local::now().date_naive());
    let Some(valid_until) = compute_expiration(from.and_time(NaiveTime::MIN), lead_business_days)
    else {
        return CommandResult::failure(
            "expiration",
            "invalid_input",
            format!("no expiration date exists {lead_business_days} business days after {from}"),
            4,
        );
    };

    let report = ExpirationReport { from, lead_business_days, valid_until: valid_until.date() };
    render_report("expiration", &report)
}
