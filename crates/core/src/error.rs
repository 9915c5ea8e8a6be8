use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("bucket map is empty")]
    EmptyMap,

    #[error("Priority not found: {0}")]
    PriorityNotFound(i32),

    #[error("Index {index} out of bounds for priority {priority} (len {len})")]
    IndexOutOfBounds { priority: i32, index: usize, len: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for BucketError {
    fn from(err: serde_json::Error) -> Self {
        BucketError::Serialize(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BucketError>;
