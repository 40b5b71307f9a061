/// Errors raised by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
