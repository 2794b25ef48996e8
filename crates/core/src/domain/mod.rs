pub mod budget;
pub mod client;
pub mod product;
