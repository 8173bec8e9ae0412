pub mod chain;
pub mod client;
