use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::info;

use crate::builder::catalog::CatalogIndex;
use crate::builder::derived::{display_order, field_states, FieldStates};
use crate::builder::expiration::default_expiration;
use crate::builder::payload::SubmitBudgetRequest;
use crate::builder::pricing::{compute_totals, BudgetTotals};
use crate::builder::reconcile::reconcile;
use crate::builder::specification::{
    apply_update, initial_specification, EditAuthority, SpecificationUpdate,
};
use crate::builder::validation::{validate_budget, ValidationReport};
use crate::config::BudgetRules;
use crate::domain::budget::{Budget, BudgetId, BudgetStatus, LineItem, LineOrigin, Specification};
use crate::domain::product::{Product, ProductId};
use crate::errors::{ApplicationError, DomainError};

/// Session-scoped state of one budget being built. Owns the specification and
/// ledger; AUTOMATIC lines are rewritten after every relevant change.
#[derive(Clone, Debug)]
pub struct BudgetBuilder {
    catalog: Option<CatalogIndex>,
    rules: BudgetRules,
    tax_rate_percent: Decimal,
    specification: Specification,
    lines: Vec<LineItem>,
    tax_enabled: bool,
    budget_id: Option<BudgetId>,
    status: BudgetStatus,
}

impl BudgetBuilder {
    pub fn open(
        catalog: Option<CatalogIndex>,
        rules: BudgetRules,
        tax_rate_percent: Decimal,
        now: NaiveDateTime,
    ) -> Self {
        let specification = initial_specification(catalog.as_ref(), &rules, now);
        Self {
            catalog,
            rules,
            tax_rate_percent,
            specification,
            lines: Vec::new(),
            tax_enabled: false,
            budget_id: None,
            status: BudgetStatus::Draft,
        }
    }

    /// Resumes editing an existing budget.
    pub fn resume(
        budget: Budget,
        catalog: Option<CatalogIndex>,
        rules: BudgetRules,
        tax_rate_percent: Decimal,
    ) -> Self {
        let mut builder = Self {
            catalog,
            rules,
            tax_rate_percent,
            specification: budget.specification,
            lines: budget.lines,
            tax_enabled: budget.tax_enabled,
            budget_id: budget.id,
            status: budget.status,
        };
        builder.reconcile();
        builder
    }

    pub fn attach_catalog(&mut self, catalog: CatalogIndex) {
        info!(
            event_name = "budget.catalog.attached",
            product_count = catalog.products().len(),
            "catalog attached to budget builder"
        );
        self.catalog = Some(catalog);
        self.reconcile();
    }

    pub fn catalog(&self) -> Option<&CatalogIndex> {
        self.catalog.as_ref()
    }

    pub fn rules(&self) -> &BudgetRules {
        &self.rules
    }

    pub fn current_specification(&self) -> &Specification {
        &self.specification
    }

    pub fn current_line_items(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn display_lines(&self) -> Vec<&LineItem> {
        display_order(&self.lines)
    }

    pub fn field_states(&self) -> FieldStates {
        field_states(&self.specification, self.catalog.as_ref())
    }

    pub fn tax_enabled(&self) -> bool {
        self.tax_enabled
    }

    pub fn set_tax_enabled(&mut self, enabled: bool) {
        self.tax_enabled = enabled;
    }

    pub fn set_specification_field(
        &mut self,
        update: SpecificationUpdate,
        authority: EditAuthority,
    ) -> Result<(), DomainError> {
        let drives_line_items = update.drives_line_items();
        apply_update(
            &mut self.specification,
            update,
            authority,
            self.catalog.as_ref(),
            &self.rules,
        )?;

        if drives_line_items {
            self.reconcile();
        }
        Ok(())
    }

    pub fn add_manual_line_item(&mut self, product: &Product) -> Result<(), DomainError> {
        if self.manual_position(&product.id).is_some() {
            return Err(DomainError::DuplicateManualLine { product_id: product.id.clone() });
        }

        self.lines.push(LineItem::from_product(product, Decimal::ONE, LineOrigin::Manual));
        Ok(())
    }

    pub fn remove_line_item(&mut self, product_id: &ProductId) -> Result<LineItem, DomainError> {
        let index = self.editable_position(product_id)?;
        Ok(self.lines.remove(index))
    }

    pub fn set_manual_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: Decimal,
    ) -> Result<(), DomainError> {
        let index = self.editable_position(product_id)?;
        if quantity < Decimal::ONE {
            return Err(DomainError::InvalidQuantity { product_id: product_id.clone(), quantity });
        }

        self.lines[index].quantity = quantity;
        Ok(())
    }

    pub fn validate(&self) -> ValidationReport {
        validate_budget(&self.specification, &self.lines, &self.rules)
    }

    pub fn compute_total(&self) -> Result<BudgetTotals, DomainError> {
        compute_totals(&self.lines, self.tax_enabled, self.tax_rate_percent)
    }

    pub fn default_expiration(&self, now: NaiveDateTime) -> NaiveDate {
        default_expiration(now, self.rules.lead_business_days)
    }

    pub fn to_budget(&self) -> Budget {
        Budget {
            id: self.budget_id.clone(),
            specification: self.specification.clone(),
            lines: self.lines.clone(),
            tax_enabled: self.tax_enabled,
            status: self.status,
        }
    }

    /// Runs the validation gate and, only when it is clean, builds the submit payload.
    pub fn prepare_submission(&self) -> Result<SubmitBudgetRequest, ApplicationError> {
        let report = self.validate();
        if !report.is_valid() {
            info!(
                event_name = "budget.submit.blocked",
                error_count = report.len(),
                "budget submission blocked by validation"
            );
            return Err(ApplicationError::InputValidation(report));
        }

        Ok(SubmitBudgetRequest::from_budget(&self.to_budget()))
    }

    pub fn mark_submitted(&mut self, budget_id: BudgetId, status: BudgetStatus) {
        self.budget_id = Some(budget_id);
        self.status = status;
    }

    fn reconcile(&mut self) {
        let reconciliation = reconcile(&self.lines, &self.specification, self.catalog.as_ref());
        self.lines = reconciliation.lines;
    }

    fn manual_position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.is_manual() && &line.product_id == product_id)
    }

    fn editable_position(&self, product_id: &ProductId) -> Result<usize, DomainError> {
        if let Some(index) = self.manual_position(product_id) {
            return Ok(index);
        }
        if self.lines.iter().any(|line| &line.product_id == product_id) {
            return Err(DomainError::AutomaticLineLocked { product_id: product_id.clone() });
        }
        Err(DomainError::UnknownLine { product_id: product_id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::BudgetBuilder;
    use crate::builder::catalog::CatalogIndex;
    use crate::builder::fixtures::{catalog_fixture, monday_morning};
    use crate::builder::payload::SubmitBudgetRequest;
    use crate::builder::specification::{EditAuthority, SpecificationUpdate};
    use crate::builder::validation::{FIELD_CONCRETE_VOLUME, FIELD_PRODUCTS, FIELD_VOLUME};
    use crate::config::BudgetRules;
    use crate::domain::budget::{AutomaticSlot, Budget};
    use crate::domain::client::ClientId;
    use crate::domain::product::ProductId;
    use crate::errors::{ApplicationError, DomainError};

    fn builder() -> BudgetBuilder {
        BudgetBuilder::open(
            Some(catalog_fixture()),
            BudgetRules::default(),
            Decimal::new(16, 0),
            monday_morning(),
        )
    }

    fn resume(budget: Budget, catalog: CatalogIndex) -> BudgetBuilder {
        BudgetBuilder::resume(budget, Some(catalog), BudgetRules::default(), Decimal::new(16, 0))
    }

    fn set(builder: &mut BudgetBuilder, update: SpecificationUpdate) {
        builder.set_specification_field(update, EditAuthority::Standard).expect("field update");
    }

    fn product_id(id: &str) -> ProductId {
        ProductId(id.to_string())
    }

    fn ready(builder: &mut BudgetBuilder) {
        set(builder, SpecificationUpdate::ClientId(Some(ClientId("cli-001".to_string()))));
        set(builder, SpecificationUpdate::Title("Losa planta alta".to_string()));
        set(builder, SpecificationUpdate::DeliveryDate(NaiveDate::from_ymd_opt(2024, 1, 10)));
    }

    #[test]
    fn volume_edit_derives_the_primary_concrete_line() {
        let mut builder = builder();
        assert!(builder.current_line_items().is_empty());

        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(14, 0))));

        let lines = builder.current_line_items();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].occupies(AutomaticSlot::PrimaryConcrete));
        assert_eq!(lines[0].product_id, product_id("c-conv-150"));
        assert_eq!(lines[0].quantity, Decimal::new(14, 0));
    }

    #[test]
    fn automatic_lines_reject_direct_edits() {
        let mut builder = builder();
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(14, 0))));

        let error = builder
            .set_manual_quantity(&product_id("c-conv-150"), Decimal::new(3, 0))
            .expect_err("automatic line is locked");
        assert!(matches!(error, DomainError::AutomaticLineLocked { .. }));

        let error = builder.remove_line_item(&product_id("c-conv-150")).expect_err("locked");
        assert!(matches!(error, DomainError::AutomaticLineLocked { .. }));
    }

    #[test]
    fn manual_lines_are_fully_editable() {
        let mut builder = builder();
        let fibra = builder
            .catalog()
            .and_then(|catalog| catalog.find(&product_id("oth-fibra")))
            .cloned()
            .expect("fixture product");

        builder.add_manual_line_item(&fibra).expect("add");
        assert!(matches!(
            builder.add_manual_line_item(&fibra),
            Err(DomainError::DuplicateManualLine { .. })
        ));

        builder.set_manual_quantity(&fibra.id, Decimal::new(4, 0)).expect("quantity");
        assert_eq!(builder.current_line_items()[0].quantity, Decimal::new(4, 0));
        assert!(matches!(
            builder.set_manual_quantity(&fibra.id, Decimal::ZERO),
            Err(DomainError::InvalidQuantity { .. })
        ));

        let removed = builder.remove_line_item(&fibra.id).expect("remove");
        assert_eq!(removed.product_id, fibra.id);
        assert!(matches!(
            builder.remove_line_item(&fibra.id),
            Err(DomainError::UnknownLine { .. })
        ));
    }

    #[test]
    fn pump_toggle_adds_and_removes_the_pump_line() {
        let mut builder = builder();
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(12, 0))));
        set(&mut builder, SpecificationUpdate::PumpRequired(true));

        let display: Vec<&str> =
            builder.display_lines().iter().map(|line| line.product_id.as_str()).collect();
        assert_eq!(display, vec!["c-conv-150", "srv-bombeo"]);

        set(&mut builder, SpecificationUpdate::PumpRequired(false));
        assert_eq!(builder.current_line_items().len(), 1);
    }

    #[test]
    fn pumping_category_implies_pump_line() {
        let mut builder = builder();
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(12, 0))));
        set(&mut builder, SpecificationUpdate::ConcreteCategory("Bombeable".to_string()));
        set(&mut builder, SpecificationUpdate::Resistance("250".to_string()));

        assert!(builder.field_states().pump_toggle_locked);
        let ids: Vec<&str> =
            builder.display_lines().iter().map(|line| line.product_id.as_str()).collect();
        assert_eq!(ids, vec!["c-bomb-250", "srv-bombeo"]);
    }

    #[test]
    fn submission_is_blocked_while_validation_fails() {
        let mut builder = builder();
        ready(&mut builder);
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(5, 0))));
        set(&mut builder, SpecificationUpdate::PumpRequired(true));

        match builder.prepare_submission() {
            Err(ApplicationError::InputValidation(report)) => {
                assert!(report.contains(FIELD_VOLUME));
                assert!(!report.contains(FIELD_CONCRETE_VOLUME));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn valid_budget_produces_submit_payload() {
        let mut builder = builder();
        ready(&mut builder);
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(15, 0))));
        set(&mut builder, SpecificationUpdate::PumpRequired(true));
        builder.set_tax_enabled(true);

        let request = builder.prepare_submission().expect("valid budget");
        assert_eq!(request.products.len(), 2);
        assert!(request.tax_enabled);

        let totals = builder.compute_total().expect("totals");
        // 15 * 1650 + 15 * 350 = 30000, plus 16% tax
        assert_eq!(totals.subtotal, Decimal::new(30_000, 0));
        assert_eq!(totals.total, Decimal::new(34_800, 0));
    }

    #[test]
    fn payload_round_trip_restores_specification_and_ledger() {
        let mut builder = builder();
        ready(&mut builder);
        set(&mut builder, SpecificationUpdate::ConcreteCategory("Pavimento".to_string()));
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(18, 0))));
        set(&mut builder, SpecificationUpdate::PumpRequired(true));
        let fibra = builder
            .catalog()
            .and_then(|catalog| catalog.find(&product_id("oth-fibra")))
            .cloned()
            .expect("fixture product");
        builder.add_manual_line_item(&fibra).expect("add");
        builder.set_manual_quantity(&fibra.id, Decimal::new(6, 0)).expect("quantity");

        let json = serde_json::to_string(&builder.prepare_submission().expect("valid"))
            .expect("serialize");
        let decoded: SubmitBudgetRequest = serde_json::from_str(&json).expect("deserialize");
        let catalog = catalog_fixture();
        let restored = decoded.into_budget(Some(&catalog));

        assert_eq!(&restored.specification, builder.current_specification());
        assert_eq!(restored.lines, builder.current_line_items());

        let resumed = resume(restored, catalog);
        assert_eq!(resumed.current_line_items(), builder.current_line_items());
    }

    #[test]
    fn round_trip_keeps_a_manual_pump_line_added_before_the_toggle() {
        let mut builder = builder();
        ready(&mut builder);
        let bombeo = builder
            .catalog()
            .and_then(|catalog| catalog.find(&product_id("srv-bombeo")))
            .cloned()
            .expect("fixture product");
        builder.add_manual_line_item(&bombeo).expect("manual pump");
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(12, 0))));
        set(&mut builder, SpecificationUpdate::PumpRequired(true));

        let before = builder.current_line_items().to_vec();
        assert_eq!(before.len(), 3);
        assert!(before[0].is_manual());
        assert_eq!(before[0].quantity, Decimal::ONE);
        assert!(before[2].occupies(AutomaticSlot::Pump));

        let request = SubmitBudgetRequest::from_budget(&builder.to_budget());
        let catalog = catalog_fixture();
        let restored = request.into_budget(Some(&catalog));
        assert_eq!(restored.lines, before);

        let resumed = resume(restored, catalog);
        assert_eq!(resumed.current_line_items(), before.as_slice());
    }

    #[test]
    fn oversized_manual_quantity_is_an_error_not_a_panic() {
        let mut builder = builder();
        ready(&mut builder);
        let fibra = builder
            .catalog()
            .and_then(|catalog| catalog.find(&product_id("oth-fibra")))
            .cloned()
            .expect("fixture product");
        builder.add_manual_line_item(&fibra).expect("add");
        builder.set_manual_quantity(&fibra.id, Decimal::MAX).expect("quantity above one");

        assert_eq!(builder.compute_total(), Err(DomainError::AmountOverflow));
        assert!(builder.validate().contains(FIELD_PRODUCTS));
        assert!(matches!(
            builder.prepare_submission(),
            Err(ApplicationError::InputValidation(report)) if report.contains(FIELD_PRODUCTS)
        ));
    }

    #[test]
    fn late_catalog_attach_derives_lines() {
        let rules = BudgetRules::default();
        let mut builder = BudgetBuilder::open(None, rules, Decimal::new(16, 0), monday_morning());
        set(&mut builder, SpecificationUpdate::Volume(Some(Decimal::new(10, 0))));
        assert!(builder.current_line_items().is_empty());

        builder.attach_catalog(catalog_fixture());
        assert_eq!(builder.current_line_items().len(), 1);
        assert_eq!(builder.current_line_items()[0].product_id, product_id("c-conv-150"));
    }

    #[test]
    fn default_expiration_uses_configured_lead_time() {
        let rules = BudgetRules { lead_business_days: 3, ..BudgetRules::default() };
        let builder = BudgetBuilder::open(None, rules, Decimal::ZERO, monday_morning());

        assert_eq!(
            builder.default_expiration(monday_morning()),
            NaiveDate::from_ymd_opt(2024, 1, 4).expect("date")
        );
        assert_eq!(
            builder.current_specification().valid_until,
            builder.default_expiration(monday_morning())
        );
    }
}
