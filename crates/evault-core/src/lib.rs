pub mod config;
pub mod error;

pub use config::EvaultConfig;
pub use error::{EvaultError, EvaultResult};
