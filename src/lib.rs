pub mod build;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod report;
pub mod services;
pub mod webhooks;

pub use error::PrBuilderError;
