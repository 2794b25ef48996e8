//! Pure derived state for the presentation layer. Controls are enabled or
//! disabled from these functions instead of from event handlers.

use serde::Serialize;

use crate::builder::catalog::{label_denotes_pump, label_is_pavement, CatalogIndex};
use crate::domain::budget::{AutomaticSlot, LineItem, Specification};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldStates {
    pub pump_toggle_locked: bool,
    pub pavement_category: bool,
    pub valid_until_requires_privilege: bool,
}

pub fn is_pavement_category(catalog: Option<&CatalogIndex>, label: &str) -> bool {
    catalog.map_or_else(|| label_is_pavement(label), |catalog| catalog.is_pavement(label))
}

pub fn category_denotes_pump(catalog: Option<&CatalogIndex>, label: &str) -> bool {
    catalog.map_or_else(|| label_denotes_pump(label), |catalog| catalog.denotes_pump(label))
}

/// A pumping category implies the pump service, so the toggle cannot be cleared.
pub fn pump_toggle_locked(specification: &Specification, catalog: Option<&CatalogIndex>) -> bool {
    category_denotes_pump(catalog, &specification.concrete_category)
}

pub fn field_states(specification: &Specification, catalog: Option<&CatalogIndex>) -> FieldStates {
    FieldStates {
        pump_toggle_locked: pump_toggle_locked(specification, catalog),
        pavement_category: is_pavement_category(catalog, &specification.concrete_category),
        valid_until_requires_privilege: true,
    }
}

/// Concrete line first, pump line second, then manual items in ledger order.
pub fn display_order(lines: &[LineItem]) -> Vec<&LineItem> {
    let slot = |slot: AutomaticSlot| lines.iter().filter(move |line| line.occupies(slot));

    slot(AutomaticSlot::PrimaryConcrete)
        .chain(slot(AutomaticSlot::Pump))
        .chain(lines.iter().filter(|line| line.is_manual()))
        .collect()
}
