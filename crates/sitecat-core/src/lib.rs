use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    normalize_domain, ClassificationRecord, ExtractionMethod, Label, RenderOptions, RunOptions,
};

/// Every variable has a default or is optional, so the only way to fail
/// configuration loading is a value that does not parse.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
