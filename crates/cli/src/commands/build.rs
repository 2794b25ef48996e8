use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use cotiza_core::{
    ApplicationError, BudgetBuilder, BudgetRules, BudgetTotals, EditAuthority, FieldStates,
    LineItem, ProductId, Specification, SpecificationUpdate, ValidationReport,
};
use cotiza_store::repositories::InMemoryBudgetStore;
use cotiza_store::{BudgetService, FixtureData, SubmitReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::commands::{load_dataset, render_report, CommandResult};

const CORRELATION_ID: &str = "cli-build";

/// A scripted editing session replayed against a fresh builder.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Clock used for the default expiration; the local time when absent.
    pub now: Option<NaiveDateTime>,
    pub authority: EditAuthority,
    pub updates: Vec<SpecificationUpdate>,
    pub manual_items: Vec<ManualItem>,
    pub remove: Vec<ProductId>,
    pub tax_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct BuildReport {
    specification: Specification,
    field_states: FieldStates,
    lines: Vec<LineItem>,
    validation: ValidationReport,
    totals: BudgetTotals,
    catalog_error: Option<String>,
    submission: Option<SubmitReceipt>,
}

pub fn run(scenario_path: &Path, fixture: Option<PathBuf>, submit: bool) -> CommandResult {
    let (config, data) = match load_dataset("build", fixture) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };
    let scenario = match load_scenario(scenario_path) {
        Ok(scenario) => scenario,
        Err(error) => {
            return CommandResult::failure("build", "invalid_scenario", format!("{error:#}"), 4)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "build",
                "runtime",
                format!("failed to initialize runtime: {error}"),
                1,
            )
        }
    };

    match runtime.block_on(execute(config.budget, data, scenario, submit)) {
        Ok(report) => render_report("build", &report),
        Err(error) => CommandResult::from_application_error("build", CORRELATION_ID, error),
    }
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read scenario `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse scenario `{}`", path.display()))
}

async fn execute(
    rules: BudgetRules,
    data: FixtureData,
    scenario: Scenario,
    submit: bool,
) -> Result<BuildReport, ApplicationError> {
    let (products, clients, settings) = data.into_repositories();
    let service =
        BudgetService::new(products, clients, settings, InMemoryBudgetStore::default(), rules);

    let now = scenario.now.unwrap_or_else(|| Local::now().naive_local());
    let opened = service.open_builder(now).await?;
    let mut builder = opened.builder;

    apply_scenario(&mut builder, scenario)?;

    let submission = if submit { Some(service.submit(&mut builder).await?) } else { None };

    Ok(BuildReport {
        specification: builder.current_specification().clone(),
        field_states: builder.field_states(),
        lines: builder.display_lines().into_iter().cloned().collect(),
        validation: builder.validate(),
        totals: builder.compute_total()?.rounded(),
        catalog_error: opened.catalog_error.map(|error| error.to_string()),
        submission,
    })
}

fn apply_scenario(builder: &mut BudgetBuilder, scenario: Scenario) -> Result<(), ApplicationError> {
    for update in scenario.updates {
        builder.set_specification_field(update, scenario.authority)?;
    }

    for item in scenario.manual_items {
        let Some(product) = builder.catalog().and_then(|catalog| catalog.find(&item.product_id))
        else {
            let mut report = ValidationReport::default();
            report.insert("products", format!("Unknown product `{}`", item.product_id));
            return Err(ApplicationError::InputValidation(report));
        };
        let product = product.clone();
        builder.add_manual_line_item(&product)?;
        if let Some(quantity) = item.quantity {
            builder.set_manual_quantity(&product.id, quantity)?;
        }
    }

    for product_id in &scenario.remove {
        builder.remove_line_item(product_id)?;
    }

    if let Some(tax_enabled) = scenario.tax_enabled {
        builder.set_tax_enabled(tax_enabled);
    }

    Ok(())
}
