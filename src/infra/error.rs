use thiserror::Error;

use crate::application::jwt::IssueError;

/// Infrastructure errors that can occur during application startup.
///
/// SECURITY: Display messages never contain secret values, only the name of
/// the variable or component at fault.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: environment variable {var} has an invalid value")]
    ConfigInvalid { var: &'static str },

    #[error("Token issuer initialization failed")]
    TokenIssuer(#[source] IssueError),

    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),

    #[error("Server error")]
    Server(#[source] std::io::Error),
}
