//! Budget construction and reconciliation.
//!
//! [`session::BudgetBuilder`] is the entry point used by the presentation
//! layer; the other modules are pure functions it composes.

pub mod catalog;
pub mod derived;
pub mod expiration;
pub mod payload;
pub mod pricing;
pub mod reconcile;
pub mod session;
pub mod specification;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;
