use thiserror::Error;

#[derive(Error, Debug)]
pub enum HearthError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Unknown charter: {0}")]
    UnknownCharter(String),
}

pub type Result<T> = std::result::Result<T, HearthError>;
