//! JSON fixture datasets standing in for the product, client and company services.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cotiza_core::domain::client::{Client, ClientId};
use cotiza_core::domain::product::{Product, ProductId, ProductType};

use crate::repositories::{
    CompanySettings, InMemoryClientRepository, InMemoryCompanySettings, InMemoryProductRepository,
};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read fixture `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse fixture `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureData {
    pub company: CompanySettings,
    #[serde(default)]
    pub clients: Vec<Client>,
    pub products: Vec<Product>,
}

impl FixtureData {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| FixtureError::Parse { path: path.to_path_buf(), source })
    }

    pub fn into_repositories(
        self,
    ) -> (InMemoryProductRepository, InMemoryClientRepository, InMemoryCompanySettings) {
        (
            InMemoryProductRepository::new(self.products),
            InMemoryClientRepository::new(self.clients),
            InMemoryCompanySettings::new(self.company),
        )
    }

    /// Small ready-mix catalog used when no fixture file is configured.
    pub fn demo() -> Self {
        use ProductType::{Concrete, Other, Service};

        let product = |id: &str, name: &str, kind, category: &str, price: i64| Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            product_type: kind,
            category: category.to_string(),
            price: Decimal::new(price, 0),
        };
        let client =
            |id: &str, name: &str| Client { id: ClientId(id.to_string()), name: name.to_string() };

        Self {
            company: CompanySettings { iva_rate: Decimal::new(16, 0) },
            clients: vec![
                client("cli-001", "Constructora del Norte"),
                client("cli-002", "Desarrollos Vial Bajío"),
            ],
            products: vec![
                product(
                    "c-conv-150",
                    "Concreto Convencional f'c 150",
                    Concrete,
                    "Convencional",
                    1650,
                ),
                product(
                    "c-conv-200",
                    "Concreto Convencional f'c 200",
                    Concrete,
                    "Convencional",
                    1750,
                ),
                product(
                    "c-conv-250",
                    "Concreto Convencional f'c 250",
                    Concrete,
                    "Convencional",
                    1850,
                ),
                product("c-bomb-200", "Concreto Bombeable f'c 200", Concrete, "Bombeable", 1950),
                product("c-bomb-250", "Concreto Bombeable f'c 250", Concrete, "Bombeable", 2050),
                product("c-pav-40", "Concreto Pavimento MR 40", Concrete, "Pavimento", 2300),
                product("c-pav-45", "Concreto vial 45 kg", Concrete, "Pavimento", 2400),
                product("srv-bombeo", "Servicio de Bombeo", Service, "Servicios", 350),
                product("oth-fibra", "Fibra de polipropileno", Other, "Aditivos", 120),
            ],
        }
    }
}
