use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::client::ClientId;
use crate::domain::product::{Product, ProductId, ProductType};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetId(pub String);

/// Lifecycle status. Transitions belong to the approval workflow, not to the builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// The derived slots the reconciliation engine owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomaticSlot {
    PrimaryConcrete,
    Pump,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "slot")]
pub enum LineOrigin {
    Automatic(AutomaticSlot),
    Manual,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub product_type: ProductType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub origin: LineOrigin,
}

impl LineItem {
    pub fn from_product(product: &Product, quantity: Decimal, origin: LineOrigin) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            product_type: product.product_type,
            quantity,
            unit_price: product.price,
            origin,
        }
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self.origin, LineOrigin::Automatic(_))
    }

    pub fn is_manual(&self) -> bool {
        self.origin == LineOrigin::Manual
    }

    pub fn occupies(&self, slot: AutomaticSlot) -> bool {
        self.origin == LineOrigin::Automatic(slot)
    }

    pub fn is_concrete(&self) -> bool {
        self.product_type == ProductType::Concrete
    }

    /// `quantity * unit_price`, or `None` when the product leaves the decimal range.
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

/// High-level project fields edited by the seller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub client_id: Option<ClientId>,
    pub title: String,
    pub address: String,
    pub delivery_date: Option<NaiveDate>,
    pub work_type: String,
    pub concrete_category: String,
    pub resistance: String,
    /// Cubic meters. `None` until the seller enters a positive number.
    pub volume: Option<Decimal>,
    pub pump_required: bool,
    pub observations: String,
    pub valid_until: NaiveDate,
}

impl Specification {
    pub fn positive_volume(&self) -> Option<Decimal> {
        self.volume.filter(|volume| *volume > Decimal::ZERO)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Option<BudgetId>,
    pub specification: Specification,
    pub lines: Vec<LineItem>,
    pub tax_enabled: bool,
    pub status: BudgetStatus,
}
