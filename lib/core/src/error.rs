use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot load an empty listing set")]
    EmptyLoad,

    #[error("embedding dimension mismatch: persisted index has {expected}, model produces {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("feed error: {0}")]
    Feed(String),
}
