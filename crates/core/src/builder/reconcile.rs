//! Derives the AUTOMATIC line items from the specification.
//!
//! Each slot is rebuilt from the catalog on every pass and swapped in whole,
//! so stale names or prices never survive. MANUAL lines are never touched.

use serde::Serialize;
use tracing::{debug, warn};

use crate::builder::catalog::CatalogIndex;
use crate::domain::budget::{AutomaticSlot, LineItem, LineOrigin, Specification};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChange {
    Unchanged,
    Inserted,
    Replaced,
    Removed,
    Vacant,
    /// No catalog is loaded; derivation was skipped.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub lines: Vec<LineItem>,
    pub concrete: SlotChange,
    pub pump: SlotChange,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        [self.concrete, self.pump].iter().any(|change| {
            matches!(change, SlotChange::Inserted | SlotChange::Replaced | SlotChange::Removed)
        })
    }
}

pub fn reconcile(
    lines: &[LineItem],
    specification: &Specification,
    catalog: Option<&CatalogIndex>,
) -> Reconciliation {
    let mut lines = lines.to_vec();

    let Some(catalog) = catalog else {
        debug!(
            event_name = "budget.reconcile.skipped",
            reason = "catalog_unavailable",
            "automatic line items not derived"
        );
        return Reconciliation { lines, concrete: SlotChange::Skipped, pump: SlotChange::Skipped };
    };

    let concrete =
        place(&mut lines, AutomaticSlot::PrimaryConcrete, concrete_line(specification, catalog));
    let pump = place(&mut lines, AutomaticSlot::Pump, pump_line(specification, catalog));

    debug!(
        event_name = "budget.reconcile.completed",
        concrete = ?concrete,
        pump = ?pump,
        line_count = lines.len(),
        "automatic line items reconciled"
    );

    Reconciliation { lines, concrete, pump }
}

fn concrete_line(specification: &Specification, catalog: &CatalogIndex) -> Option<LineItem> {
    let volume = specification.positive_volume()?;

    let Some(product) = catalog
        .resolve_concrete_product(&specification.concrete_category, &specification.resistance)
    else {
        warn!(
            event_name = "budget.catalog.resolution_miss",
            category = %specification.concrete_category,
            resistance = %specification.resistance,
            "no concrete product matches category and resistance"
        );
        return None;
    };

    Some(LineItem::from_product(
        product,
        volume,
        LineOrigin::Automatic(AutomaticSlot::PrimaryConcrete),
    ))
}

fn pump_line(specification: &Specification, catalog: &CatalogIndex) -> Option<LineItem> {
    if !specification.pump_required {
        return None;
    }
    let volume = specification.positive_volume()?;

    let Some(product) = catalog.resolve_pump_product() else {
        warn!(event_name = "budget.catalog.pump_missing", "catalog has no pump service product");
        return None;
    };

    Some(LineItem::from_product(product, volume, LineOrigin::Automatic(AutomaticSlot::Pump)))
}

fn place(lines: &mut Vec<LineItem>, slot: AutomaticSlot, desired: Option<LineItem>) -> SlotChange {
    let position = lines.iter().position(|line| line.occupies(slot));

    let change = match (position, desired) {
        (Some(index), Some(line)) if lines[index] == line => SlotChange::Unchanged,
        (Some(index), Some(line)) => {
            lines[index] = line;
            SlotChange::Replaced
        }
        (None, Some(line)) => {
            lines.push(line);
            SlotChange::Inserted
        }
        (Some(_), None) => SlotChange::Removed,
        (None, None) => SlotChange::Vacant,
    };

    // Only the occupant kept above may remain in the slot.
    let keep = match change {
        SlotChange::Removed => None,
        _ => position.or_else(|| lines.len().checked_sub(1)),
    };
    let mut index = 0;
    lines.retain(|line| {
        let current = index;
        index += 1;
        !line.occupies(slot) || Some(current) == keep
    });

    change
}
