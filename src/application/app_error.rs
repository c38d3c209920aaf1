use thiserror::Error;

use crate::application::{jwt::IssueError, telegram::VerifyError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    InvalidCredentials,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

// Every verification failure collapses into one response so callers cannot
// tell which check failed.
impl From<VerifyError> for AppError {
    fn from(_: VerifyError) -> Self {
        AppError::InvalidCredentials
    }
}

impl From<IssueError> for AppError {
    fn from(e: IssueError) -> Self {
        AppError::Internal(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
