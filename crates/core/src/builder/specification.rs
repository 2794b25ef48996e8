use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::builder::catalog::{normalize, CatalogIndex};
use crate::builder::derived::{category_denotes_pump, is_pavement_category, pump_toggle_locked};
use crate::builder::expiration::default_expiration;
use crate::config::BudgetRules;
use crate::domain::budget::Specification;
use crate::domain::client::ClientId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAuthority {
    #[default]
    Standard,
    Privileged,
}

/// One field edit. Deserializes from `{"field": "...", "value": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SpecificationUpdate {
    ClientId(Option<ClientId>),
    Title(String),
    Address(String),
    DeliveryDate(Option<NaiveDate>),
    WorkType(String),
    ConcreteCategory(String),
    Resistance(String),
    Volume(Option<Decimal>),
    PumpRequired(bool),
    Observations(String),
    ValidUntil(NaiveDate),
}

impl SpecificationUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::ClientId(_) => "client_id",
            Self::Title(_) => "title",
            Self::Address(_) => "address",
            Self::DeliveryDate(_) => "delivery_date",
            Self::WorkType(_) => "work_type",
            Self::ConcreteCategory(_) => "concrete_category",
            Self::Resistance(_) => "resistance",
            Self::Volume(_) => "volume",
            Self::PumpRequired(_) => "pump_required",
            Self::Observations(_) => "observations",
            Self::ValidUntil(_) => "valid_until",
        }
    }

    /// Fields that feed the reconciliation engine.
    pub fn drives_line_items(&self) -> bool {
        matches!(
            self,
            Self::ConcreteCategory(_)
                | Self::Resistance(_)
                | Self::Volume(_)
                | Self::PumpRequired(_)
        )
    }
}

pub fn initial_specification(
    catalog: Option<&CatalogIndex>,
    rules: &BudgetRules,
    now: NaiveDateTime,
) -> Specification {
    let concrete_category = catalog
        .and_then(CatalogIndex::first_category)
        .map_or_else(|| rules.default_category.clone(), str::to_string);

    let mut specification = Specification {
        client_id: None,
        title: String::new(),
        address: String::new(),
        delivery_date: None,
        work_type: rules.default_work_type.clone(),
        concrete_category: String::new(),
        resistance: rules.default_resistance.clone(),
        volume: None,
        pump_required: false,
        observations: String::new(),
        valid_until: default_expiration(now, rules.lead_business_days),
    };
    apply_category(&mut specification, concrete_category, catalog, rules);
    specification
}

pub fn apply_update(
    specification: &mut Specification,
    update: SpecificationUpdate,
    authority: EditAuthority,
    catalog: Option<&CatalogIndex>,
    rules: &BudgetRules,
) -> Result<(), DomainError> {
    match update {
        SpecificationUpdate::ClientId(client_id) => specification.client_id = client_id,
        SpecificationUpdate::Title(title) => specification.title = title,
        SpecificationUpdate::Address(address) => specification.address = address,
        SpecificationUpdate::DeliveryDate(date) => specification.delivery_date = date,
        SpecificationUpdate::WorkType(work_type) => specification.work_type = work_type,
        SpecificationUpdate::ConcreteCategory(label) => {
            if normalize(&label) != normalize(&specification.concrete_category) {
                apply_category(specification, label, catalog, rules);
            }
        }
        SpecificationUpdate::Resistance(resistance) => specification.resistance = resistance,
        SpecificationUpdate::Volume(volume) => {
            specification.volume = volume.filter(|volume| *volume > Decimal::ZERO);
        }
        SpecificationUpdate::PumpRequired(required) => {
            if !required && pump_toggle_locked(specification, catalog) {
                return Err(DomainError::FieldLocked {
                    field: "pump_required".to_string(),
                    reason: format!(
                        "category `{}` always requires pumping",
                        specification.concrete_category
                    ),
                });
            }
            specification.pump_required = required;
        }
        SpecificationUpdate::Observations(observations) => {
            specification.observations = observations
        }
        SpecificationUpdate::ValidUntil(date) => {
            if authority != EditAuthority::Privileged {
                return Err(DomainError::PrivilegedField { field: "valid_until".to_string() });
            }
            specification.valid_until = date;
        }
    }

    Ok(())
}

fn apply_category(
    specification: &mut Specification,
    label: String,
    catalog: Option<&CatalogIndex>,
    rules: &BudgetRules,
) {
    let was_pavement = !specification.concrete_category.is_empty()
        && is_pavement_category(catalog, &specification.concrete_category);
    let is_pavement = is_pavement_category(catalog, &label);

    if category_denotes_pump(catalog, &label) {
        specification.pump_required = true;
    }
    if is_pavement {
        specification.resistance = rules.pavement_resistance.clone();
    } else if was_pavement {
        specification.resistance = rules.default_resistance.clone();
    }

    specification.concrete_category = label;
}
