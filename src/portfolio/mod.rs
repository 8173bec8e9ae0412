pub mod embedder;
pub mod index;
pub mod store;

pub use store::{LinkSource, Portfolio, PortfolioError};
