pub mod encoding;
pub mod relay_config;

pub use encoding::{EncodingParams, ListSize, TranscodeMode, MIN_LIST_SIZE};
pub use relay_config::{Channel, RelayConfig, RelayProfile, SourceMode};
