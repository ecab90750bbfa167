use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn invalid_input(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidInput(msg.into())
}

pub(crate) fn invalid_state(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidState(msg.into())
}
