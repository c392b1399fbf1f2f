pub mod config;
pub mod json;
pub mod types;

pub use config::{load_config, Config, FileConfig, LogFormat, StoreBackend};
pub use json::normalize_numbers;
pub use types::*;
