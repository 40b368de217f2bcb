pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod supervisor;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use config::Settings;
pub use error::{Error, Result};
pub use models::{Channel, EncodingParams, ListSize, RelayConfig, RelayProfile, SourceMode, TranscodeMode};
pub use service::RelayService;
pub use store::ConfigStore;
pub use supervisor::{RelayStatus, RelaySupervisor, SupervisorOptions};
pub use validation::{ValidationError, ValidationResult};
