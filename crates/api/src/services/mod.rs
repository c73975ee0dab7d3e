pub mod admin;
pub mod applications;
pub mod audit;
pub mod cafeterias;
pub mod error;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod pricing;
pub mod support;

pub use error::*;
