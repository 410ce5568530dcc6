pub mod audit;
pub mod warehouse;
