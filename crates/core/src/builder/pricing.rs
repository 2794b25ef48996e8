use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::budget::LineItem;
use crate::errors::DomainError;

const PRESENTATION_DECIMALS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

/// Unrounded totals. Round with [`BudgetTotals::rounded`] only when presenting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub trace: Vec<PricingTraceStep>,
}

impl BudgetTotals {
    pub fn rounded(&self) -> Self {
        let round = |value: Decimal| value.round_dp(PRESENTATION_DECIMALS);
        Self {
            subtotal: round(self.subtotal),
            tax: round(self.tax),
            total: round(self.total),
            trace: self
                .trace
                .iter()
                .map(|step| PricingTraceStep { amount: round(step.amount), ..step.clone() })
                .collect(),
        }
    }
}

/// Blank or non-numeric quantity input counts as zero. Exponent notation
/// (`1.5e2`) is accepted.
pub fn coerce_quantity(raw: &str) -> Decimal {
    let raw = raw.trim();
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .unwrap_or(Decimal::ZERO)
}

/// Sum of line amounts. Every step is checked so oversized input is an error,
/// never a panic.
pub fn subtotal(lines: &[LineItem]) -> Result<Decimal, DomainError> {
    lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        line.amount().and_then(|amount| sum.checked_add(amount)).ok_or(DomainError::AmountOverflow)
    })
}

pub fn compute_totals(
    lines: &[LineItem],
    tax_enabled: bool,
    tax_rate_percent: Decimal,
) -> Result<BudgetTotals, DomainError> {
    let subtotal = subtotal(lines)?;
    let total = if tax_enabled {
        tax_rate_percent
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|rate| rate.checked_add(Decimal::ONE))
            .and_then(|factor| subtotal.checked_mul(factor))
            .ok_or(DomainError::AmountOverflow)?
    } else {
        subtotal
    };
    let tax = total.checked_sub(subtotal).ok_or(DomainError::AmountOverflow)?;

    let mut trace = vec![PricingTraceStep {
        stage: "subtotal".to_string(),
        detail: "sum(quantity * unit_price)".to_string(),
        amount: subtotal,
    }];
    if tax_enabled {
        trace.push(PricingTraceStep {
            stage: "tax".to_string(),
            detail: format!("subtotal * {tax_rate_percent}%"),
            amount: tax,
        });
    }

    Ok(BudgetTotals { subtotal, tax, total, trace })
}
