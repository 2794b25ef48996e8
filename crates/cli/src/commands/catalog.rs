use std::path::PathBuf;

use cotiza_core::{CatalogIndex, Category, ProductId};
use serde::Serialize;

use crate::commands::{load_dataset, render_report, CommandResult};

#[derive(Debug, Serialize)]
struct CatalogReport {
    product_count: usize,
    categories: Vec<Category>,
    pump_product: Option<ProductId>,
    resolutions: Vec<Resolution>,
}

#[derive(Debug, Serialize)]
struct Resolution {
    category: String,
    resistance: String,
    product_id: Option<ProductId>,
}

pub fn run(fixture: Option<PathBuf>, resistances: Vec<String>) -> CommandResult {
    let (config, data) = match load_dataset("catalog", fixture) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };
    let catalog = CatalogIndex::new(data.products);

    let resistances = if resistances.is_empty() {
        vec![config.budget.default_resistance.clone(), config.budget.pavement_resistance.clone()]
    } else {
        resistances
    };
    let resistances: Vec<&str> = resistances.iter().map(String::as_str).collect();

    let resolutions = catalog
        .resolution_table(&resistances)
        .into_iter()
        .map(|(key, product_id)| Resolution {
            category: key.category,
            resistance: key.resistance,
            product_id,
        })
        .collect();

    let report = CatalogReport {
        product_count: catalog.products().len(),
        categories: catalog.categories().to_vec(),
        pump_product: catalog.resolve_pump_product().map(|product| product.id.clone()),
        resolutions,
    };
    render_report("catalog", &report)
}
