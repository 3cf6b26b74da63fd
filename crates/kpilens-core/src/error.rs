use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("fragment for {0} did not serialize to an object")]
    NotAnObject(&'static str),
}
