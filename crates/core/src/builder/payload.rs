//! Wire shape accepted by the persistence collaborator, and the way back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::builder::catalog::CatalogIndex;
use crate::builder::pricing::coerce_quantity;
use crate::domain::budget::{
    AutomaticSlot, Budget, BudgetStatus, LineItem, LineOrigin, Specification,
};
use crate::domain::client::ClientId;
use crate::domain::product::{ProductId, ProductType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadLine {
    pub product_id: ProductId,
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBudgetRequest {
    pub client_id: Option<ClientId>,
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub work_type: String,
    pub concrete_category: String,
    pub resistance: String,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub pump_required: bool,
    #[serde(default)]
    pub observations: String,
    pub valid_until: NaiveDate,
    #[serde(default)]
    pub tax_enabled: bool,
    pub products: Vec<PayloadLine>,
}

impl SubmitBudgetRequest {
    pub fn from_parts(
        specification: &Specification,
        lines: &[LineItem],
        tax_enabled: bool,
    ) -> Self {
        let specification = specification.clone();
        Self {
            client_id: specification.client_id,
            title: specification.title,
            address: specification.address,
            delivery_date: specification.delivery_date,
            work_type: specification.work_type,
            concrete_category: specification.concrete_category,
            resistance: specification.resistance,
            volume: specification.volume,
            pump_required: specification.pump_required,
            observations: specification.observations,
            valid_until: specification.valid_until,
            tax_enabled,
            products: lines
                .iter()
                .map(|line| PayloadLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price: Some(line.unit_price),
                })
                .collect(),
        }
    }

    pub fn from_budget(budget: &Budget) -> Self {
        Self::from_parts(&budget.specification, &budget.lines, budget.tax_enabled)
    }

    /// Rebuilds a draft budget. Names and types come from the catalog; the lines
    /// the engine would derive for this specification get their AUTOMATIC origin back.
    pub fn into_budget(self, catalog: Option<&CatalogIndex>) -> Budget {
        let specification = Specification {
            client_id: self.client_id,
            title: self.title,
            address: self.address,
            delivery_date: self.delivery_date,
            work_type: self.work_type,
            concrete_category: self.concrete_category,
            resistance: self.resistance,
            volume: self.volume.filter(|volume| *volume > Decimal::ZERO),
            pump_required: self.pump_required,
            observations: self.observations,
            valid_until: self.valid_until,
        };

        let mut lines: Vec<LineItem> =
            self.products.into_iter().map(|line| restore_line(line, catalog)).collect();

        if let (Some(catalog), Some(volume)) = (catalog, specification.positive_volume()) {
            let concrete = catalog
                .resolve_concrete_product(
                    &specification.concrete_category,
                    &specification.resistance,
                )
                .map(|product| product.id.clone());
            adopt(&mut lines, concrete, volume, AutomaticSlot::PrimaryConcrete);

            if specification.pump_required {
                let pump = catalog.resolve_pump_product().map(|product| product.id.clone());
                adopt(&mut lines, pump, volume, AutomaticSlot::Pump);
            }
        }

        Budget {
            id: None,
            specification,
            lines,
            tax_enabled: self.tax_enabled,
            status: BudgetStatus::Draft,
        }
    }
}

fn restore_line(line: PayloadLine, catalog: Option<&CatalogIndex>) -> LineItem {
    let product = catalog.and_then(|catalog| catalog.find(&line.product_id));
    if product.is_none() {
        warn!(
            event_name = "budget.payload.unknown_product",
            product_id = %line.product_id,
            "restoring line for a product missing from the catalog"
        );
    }

    LineItem {
        name: product.map_or_else(|| line.product_id.0.clone(), |product| product.name.clone()),
        product_type: product.map_or(ProductType::Other, |product| product.product_type),
        unit_price: line
            .unit_price
            .or_else(|| product.map(|product| product.price))
            .unwrap_or(Decimal::ZERO),
        quantity: line.quantity,
        product_id: line.product_id,
        origin: LineOrigin::Manual,
    }
}

/// Re-tags the line the engine would own. A MANUAL line for the same product
/// may sit next to it, so the candidate carrying `volume` wins, then the last one.
fn adopt(
    lines: &mut [LineItem],
    product_id: Option<ProductId>,
    volume: Decimal,
    slot: AutomaticSlot,
) {
    let Some(product_id) = product_id else {
        return;
    };
    let candidates: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.is_manual() && line.product_id == product_id)
        .map(|(index, _)| index)
        .collect();
    let chosen = candidates
        .iter()
        .rev()
        .find(|index| lines[**index].quantity == volume)
        .or_else(|| candidates.last());

    if let Some(&index) = chosen {
        lines[index].origin = LineOrigin::Automatic(slot);
    }
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(number) => {
            let quantity = coerce_quantity(&number.to_string());
            if quantity.is_zero() {
                number.as_f64().and_then(|value| Decimal::try_from(value).ok()).unwrap_or(quantity)
            } else {
                quantity
            }
        }
        serde_json::Value::String(text) => coerce_quantity(&text),
        _ => Decimal::ZERO,
    })
}
