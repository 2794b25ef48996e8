//! Orchestrates the collaborators around one builder session: the one-time
//! catalog fetch, client lookup, and the validation-gated submit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{info, warn};

use cotiza_core::builder::catalog::CatalogIndex;
use cotiza_core::config::BudgetRules;
use cotiza_core::domain::client::Client;
use cotiza_core::{ApplicationError, BudgetBuilder, SubmitBudgetRequest};

use crate::repositories::{
    BudgetSubmitter, ClientRepository, CompanySettingsRepository, ProductRepository,
    RepositoryError, SubmitReceipt,
};

/// A freshly opened builder. `catalog_error` is set when the catalog fetch
/// failed and the builder fell back to manual entry.
#[derive(Debug)]
pub struct OpenedBuilder {
    pub builder: BudgetBuilder,
    pub catalog_error: Option<ApplicationError>,
}

pub struct BudgetService<P, C, S, B> {
    products: P,
    clients: C,
    settings: S,
    submitter: B,
    rules: BudgetRules,
}

impl<P, C, S, B> BudgetService<P, C, S, B>
where
    P: ProductRepository,
    C: ClientRepository,
    S: CompanySettingsRepository,
    B: BudgetSubmitter,
{
    pub fn new(products: P, clients: C, settings: S, submitter: B, rules: BudgetRules) -> Self {
        Self { products, clients, settings, submitter, rules }
    }

    pub fn submitter(&self) -> &B {
        &self.submitter
    }

    pub async fn load_catalog(&self) -> Result<CatalogIndex, ApplicationError> {
        let products = self
            .products
            .list_products()
            .await
            .map_err(|error| fetch_error("product catalog", error))?;
        info!(
            event_name = "budget.catalog.loaded",
            product_count = products.len(),
            "product catalog loaded"
        );
        Ok(CatalogIndex::new(products))
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, ApplicationError> {
        self.clients.list_clients().await.map_err(|error| fetch_error("clients", error))
    }

    pub async fn tax_rate_percent(&self) -> Result<Decimal, ApplicationError> {
        let settings = self
            .settings
            .load_settings()
            .await
            .map_err(|error| fetch_error("company configuration", error))?;
        if settings.iva_rate < Decimal::ZERO {
            return Err(ApplicationError::Configuration(format!(
                "iva rate must not be negative, got {}",
                settings.iva_rate
            )));
        }
        Ok(settings.iva_rate)
    }

    /// Company configuration is required; a catalog failure degrades to manual entry.
    pub async fn open_builder(
        &self,
        now: NaiveDateTime,
    ) -> Result<OpenedBuilder, ApplicationError> {
        let tax_rate_percent = self.tax_rate_percent().await?;

        let (catalog, catalog_error) = match self.load_catalog().await {
            Ok(catalog) => (Some(catalog), None),
            Err(error) => {
                warn!(
                    event_name = "budget.catalog.degraded",
                    error = %error,
                    "catalog unavailable, automatic line items disabled"
                );
                (None, Some(error))
            }
        };

        Ok(OpenedBuilder {
            builder: BudgetBuilder::open(catalog, self.rules.clone(), tax_rate_percent, now),
            catalog_error,
        })
    }

    /// Reopens a previously submitted payload for editing.
    pub async fn resume_builder(
        &self,
        request: SubmitBudgetRequest,
    ) -> Result<BudgetBuilder, ApplicationError> {
        let tax_rate_percent = self.tax_rate_percent().await?;
        let catalog = self.load_catalog().await?;
        let budget = request.into_budget(Some(&catalog));
        Ok(BudgetBuilder::resume(budget, Some(catalog), self.rules.clone(), tax_rate_percent))
    }

    /// Submits once. Rejections are returned verbatim and the builder is left
    /// untouched so the user can correct and resubmit.
    pub async fn submit(
        &self,
        builder: &mut BudgetBuilder,
    ) -> Result<SubmitReceipt, ApplicationError> {
        let request = builder.prepare_submission()?;

        match self.submitter.submit(request).await {
            Ok(receipt) => {
                info!(
                    event_name = "budget.submit.accepted",
                    budget_id = %receipt.budget_id.0,
                    "budget submitted"
                );
                builder.mark_submitted(receipt.budget_id.clone(), receipt.status);
                Ok(receipt)
            }
            Err(error) => {
                warn!(
                    event_name = "budget.submit.rejected",
                    error = %error,
                    "budget submission failed"
                );
                Err(ApplicationError::Persistence(error.to_string()))
            }
        }
    }
}

fn fetch_error(resource: &str, error: RepositoryError) -> ApplicationError {
    ApplicationError::ExternalFetch { resource: resource.to_string(), message: error.to_string() }
}
