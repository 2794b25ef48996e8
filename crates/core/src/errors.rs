use rust_decimal::Decimal;
use thiserror::Error;

use crate::{builder::validation::ValidationReport, domain::product::ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("line `{product_id}` is derived automatically and cannot be edited directly")]
    AutomaticLineLocked { product_id: ProductId },
    #[error("no line item for product `{product_id}`")]
    UnknownLine { product_id: ProductId },
    #[error("product `{product_id}` is already on the budget")]
    DuplicateManualLine { product_id: ProductId },
    #[error("quantity {quantity} for `{product_id}` must be at least 1")]
    InvalidQuantity { product_id: ProductId, quantity: Decimal },
    #[error("field `{field}` can only be changed by a privileged caller")]
    PrivilegedField { field: String },
    #[error("field `{field}` is locked: {reason}")]
    FieldLocked { field: String, reason: String },
    #[error("budget amounts exceed the supported numeric range")]
    AmountOverflow,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("budget validation failed: {0}")]
    InputValidation(ValidationReport),
    #[error("could not load {resource}: {message}")]
    ExternalFetch { resource: String, message: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The budget could not be processed. Review the highlighted fields and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Validation failures and ledger misuse are fixed by the user; everything else is retried.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::InputValidation(_))
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::InputValidation(report) => {
                Self::BadRequest { message: report.to_string(), correlation_id }
            }
            ApplicationError::ExternalFetch { resource, message } => Self::ServiceUnavailable {
                message: format!("{resource}: {message}"),
                correlation_id,
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
