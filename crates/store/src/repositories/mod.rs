use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cotiza_core::domain::budget::{BudgetId, BudgetStatus};
use cotiza_core::domain::client::Client;
use cotiza_core::domain::product::Product;
use cotiza_core::SubmitBudgetRequest;

pub mod memory;

pub use memory::{
    InMemoryBudgetStore, InMemoryClientRepository, InMemoryCompanySettings,
    InMemoryProductRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
    /// Business-rule rejection from the backend; the message is shown as-is.
    #[error("{0}")]
    Rejected(String),
}

/// Tenant-level settings supplied by the company configuration service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub iva_rate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub budget_id: BudgetId,
    pub status: BudgetStatus,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError>;
}

#[async_trait]
pub trait CompanySettingsRepository: Send + Sync {
    async fn load_settings(&self) -> Result<CompanySettings, RepositoryError>;
}

#[async_trait]
pub trait BudgetSubmitter: Send + Sync {
    async fn submit(&self, request: SubmitBudgetRequest) -> Result<SubmitReceipt, RepositoryError>;
}
