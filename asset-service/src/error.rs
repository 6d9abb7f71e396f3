use crate::store::StoreError;

/// Terminal request outcomes reported to the caller.
///
/// Simulation-trigger failures are deliberately absent: they are recovered
/// locally after the event transition has committed and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("operation not permitted")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => {
                ServiceError::Conflict(format!("a {what} with this key already exists"))
            }
            StoreError::OpenEvent(_) => {
                ServiceError::Conflict("an open event already exists for this plant".to_string())
            }
            StoreError::Concluded(_) => {
                ServiceError::Conflict("event already concluded".to_string())
            }
            StoreError::Database(message) => ServiceError::Storage(message),
        }
    }
}
