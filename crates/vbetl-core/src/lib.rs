pub mod app_config;
pub mod categories;
pub mod config;
pub mod dimensions;

pub use app_config::{AppConfig, OutputPaths};
pub use categories::CategoryMap;
pub use config::{load_app_config, load_secrets, SecretsFile};
pub use dimensions::{
    default_dimension_configs, load_dimension_configs, validate_dimensions, DimensionConfig,
    DimensionsFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("missing required field '{0}' in secrets file")]
    MissingField(String),

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    SecretsFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse dimensions file: {0}")]
    DimensionsFileParse(#[from] serde_yaml::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
