pub mod builder;
pub mod config;
pub mod domain;
pub mod errors;

pub use builder::catalog::{CatalogIndex, Category, ResolutionKey};
pub use builder::derived::FieldStates;
pub use builder::expiration::{compute_expiration, default_expiration};
pub use builder::payload::{PayloadLine, SubmitBudgetRequest};
pub use builder::pricing::BudgetTotals;
pub use builder::session::BudgetBuilder;
pub use builder::specification::{EditAuthority, SpecificationUpdate};
pub use builder::validation::ValidationReport;
pub use config::BudgetRules;
pub use domain::budget::{
    AutomaticSlot, Budget, BudgetId, BudgetStatus, LineItem, LineOrigin, Specification,
};
pub use domain::client::{Client, ClientId};
pub use domain::product::{Product, ProductId, ProductType};
pub use errors::{ApplicationError, DomainError, InterfaceError};
