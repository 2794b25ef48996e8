//! Submit-time validation. Every violation is collected; nothing is auto-fixed.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::builder::catalog::name_denotes_pump;
use crate::builder::expiration::is_business_day;
use crate::builder::pricing::subtotal;
use crate::config::BudgetRules;
use crate::domain::budget::{AutomaticSlot, LineItem, Specification};

pub const FIELD_CLIENT: &str = "client_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_PRODUCTS: &str = "products";
pub const FIELD_DELIVERY_DATE: &str = "delivery_date";
pub const FIELD_VOLUME: &str = "volume";
pub const FIELD_PUMP_QUANTITY: &str = "pump_quantity";
pub const FIELD_CONCRETE_VOLUME: &str = "concrete_volume";

/// Field name to message. Empty means the budget may be submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Automatic pump slot, or any non-concrete line named like a pump service.
pub fn is_pump_line(line: &LineItem) -> bool {
    line.occupies(AutomaticSlot::Pump) || (!line.is_concrete() && name_denotes_pump(&line.name))
}

pub fn validate_budget(
    specification: &Specification,
    lines: &[LineItem],
    rules: &BudgetRules,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if specification.client_id.as_ref().map_or(true, |id| id.0.trim().is_empty()) {
        report.insert(FIELD_CLIENT, "Select a client for this budget");
    }
    if specification.title.trim().is_empty() {
        report.insert(FIELD_TITLE, "Title is required");
    }
    if lines.is_empty() {
        report.insert(FIELD_PRODUCTS, "Add at least one product to the budget");
    } else if subtotal(lines).is_err() {
        report.insert(FIELD_PRODUCTS, "Line amounts exceed the supported range");
    }

    if let Some(date) = specification.delivery_date {
        if !is_business_day(date) {
            report.insert(FIELD_DELIVERY_DATE, "Deliveries are not scheduled on Sundays");
        }
    }

    let volume = specification.positive_volume();
    let pump_lines: Vec<&LineItem> = lines.iter().filter(|line| is_pump_line(line)).collect();

    if specification.pump_required || !pump_lines.is_empty() {
        if volume.map_or(true, |volume| volume < rules.pump_minimum_volume) {
            report.insert(
                FIELD_VOLUME,
                format!(
                    "Pumping requires a volume of at least {} m³",
                    display(rules.pump_minimum_volume)
                ),
            );
        }

        if let Some(volume) = volume {
            let mismatched = pump_lines
                .iter()
                .find(|line| !within(line.quantity, volume, rules.volume_tolerance));
            if let Some(line) = mismatched {
                report.insert(
                    FIELD_PUMP_QUANTITY,
                    format!(
                        "Pump service quantity {} m³ must match the budget volume {} m³",
                        display(line.quantity),
                        display(volume)
                    ),
                );
            }
        }
    }

    let concrete: Vec<&LineItem> = lines.iter().filter(|line| line.is_concrete()).collect();
    if let (Some(volume), false) = (volume, concrete.is_empty()) {
        let total =
            concrete.iter().try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.quantity));
        match total {
            Some(total) if !within(total, volume, rules.volume_tolerance) => report.insert(
                FIELD_CONCRETE_VOLUME,
                format!(
                    "Concrete quantities do not match the budget volume: {} vs {} m³",
                    display(total),
                    display(volume)
                ),
            ),
            Some(_) => {}
            None => report
                .insert(FIELD_CONCRETE_VOLUME, "Concrete quantities exceed the supported range"),
        }
    }

    report
}

fn within(value: Decimal, target: Decimal, tolerance: Decimal) -> bool {
    value.checked_sub(target).is_some_and(|difference| difference.abs() <= tolerance)
}

fn display(value: Decimal) -> Decimal {
    value.normalize()
}
