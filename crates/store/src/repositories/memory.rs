use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use cotiza_core::domain::budget::{BudgetId, BudgetStatus};
use cotiza_core::domain::client::Client;
use cotiza_core::domain::product::Product;
use cotiza_core::SubmitBudgetRequest;

use super::{
    BudgetSubmitter, ClientRepository, CompanySettings, CompanySettingsRepository,
    ProductRepository, RepositoryError, SubmitReceipt,
};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.clone())
    }
}

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<Vec<Client>>,
}

impl InMemoryClientRepository {
    pub fn new(clients: Vec<Client>) -> Self {
        Self { clients: RwLock::new(clients) }
    }
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients.clone())
    }
}

pub struct InMemoryCompanySettings {
    settings: CompanySettings,
}

impl InMemoryCompanySettings {
    pub fn new(settings: CompanySettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl CompanySettingsRepository for InMemoryCompanySettings {
    async fn load_settings(&self) -> Result<CompanySettings, RepositoryError> {
        Ok(self.settings.clone())
    }
}

/// Accepts every submission and files it as PENDING under a fresh id.
#[derive(Default)]
pub struct InMemoryBudgetStore {
    budgets: RwLock<HashMap<String, SubmitBudgetRequest>>,
}

impl InMemoryBudgetStore {
    pub async fn get(&self, id: &BudgetId) -> Option<SubmitBudgetRequest> {
        let budgets = self.budgets.read().await;
        budgets.get(&id.0).cloned()
    }

    pub async fn len(&self) -> usize {
        self.budgets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.budgets.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl BudgetSubmitter for InMemoryBudgetStore {
    async fn submit(&self, request: SubmitBudgetRequest) -> Result<SubmitReceipt, RepositoryError> {
        let budget_id = BudgetId(Uuid::new_v4().to_string());
        let mut budgets = self.budgets.write().await;
        budgets.insert(budget_id.0.clone(), request);
        Ok(SubmitReceipt { budget_id, status: BudgetStatus::Pending })
    }
}
