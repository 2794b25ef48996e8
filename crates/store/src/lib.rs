pub mod fixtures;
pub mod repositories;
pub mod service;

pub use fixtures::{FixtureData, FixtureError};
pub use repositories::{
    BudgetSubmitter, ClientRepository, CompanySettings, CompanySettingsRepository,
    ProductRepository, RepositoryError, SubmitReceipt,
};
pub use service::{BudgetService, OpenedBuilder};
