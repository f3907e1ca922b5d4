//! Error tracing extensions
//!
//! Logs server errors with their JSON-RPC code and source chain.

use std::error::Error as StdError;

use crate::types::IqPilotError;

/// Extension trait for adding tracing context to errors
pub trait ErrorTraceExt {
    /// Log error with its code, client/server classification and error chain
    fn trace_error(&self) -> &Self;
}

impl ErrorTraceExt for IqPilotError {
    fn trace_error(&self) -> &Self {
        let error_code = self.error_code();

        let mut error_chain = Vec::new();
        let mut current_source = self.source();
        while let Some(source) = current_source {
            error_chain.push(source.to_string());
            current_source = source.source();
        }

        if self.is_client_error() {
            tracing::warn!(
                error = %self,
                error_code = error_code.code(),
                error_code_name = ?error_code,
                error_chain = ?error_chain,
                "Request failed"
            );
        } else {
            tracing::error!(
                error = %self,
                error_code = error_code.code(),
                error_code_name = ?error_code,
                error_chain_len = error_chain.len(),
                error_chain = ?error_chain,
                "Error occurred with full context"
            );
        }

        self
    }
}

/// Extension trait for Result types
pub trait ResultTraceExt<T>: Sized {
    /// Convert the error into an `IqPilotError` and log it
    fn trace_context(self) -> Result<T, IqPilotError>;
}

impl<T, E> ResultTraceExt<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
    IqPilotError: From<E>,
{
    fn trace_context(self) -> Result<T, IqPilotError> {
        self.map_err(|e| {
            let error = IqPilotError::from(e);
            error.trace_error();
            error
        })
    }
}
