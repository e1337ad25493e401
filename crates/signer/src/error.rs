use axum::http::StatusCode;
use axum_core::response::{IntoResponse as AxumCoreIntoResponse, Response};
use eyre::Report;
use std::io;

/// Failure reported by a [`PackageSigner`](crate::rpm::PackageSigner).
///
/// Signers tag what went wrong so the handler can tell a caller fault
/// from a server fault without inspecting error internals.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("unexpected EOF")]
    TruncatedInput,
    #[error("error reading request body: {0}")]
    ConnectionFault(axum::Error),
    #[error(transparent)]
    Other(#[from] Report),
}

impl SignError {
    /// Tag an error raised while reading the request body.
    ///
    /// hyper reports a body that ends before its declared length as an
    /// `UnexpectedEof` io error somewhere in the source chain; that is a
    /// truncated upload, everything else is a connection fault.
    pub fn from_body_error(error: axum::Error) -> Self {
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&error);
        while let Some(cause) = source {
            if cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
            {
                return SignError::TruncatedInput;
            }
            source = cause.source();
        }
        SignError::ConnectionFault(error)
    }
}

/// Errors surfaced by the `/sign_rpm` endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("'{0}' query parameter is required")]
    MissingParameter(&'static str),
    #[error("access denied")]
    AccessDenied,
    #[error("unexpected EOF")]
    UnexpectedEof,
    #[error("error reading from socket")]
    SocketRead,
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] Report),
}

impl ServerError {
    /// Whether the failure should be reported to operators.
    pub fn is_internal(&self) -> bool {
        matches!(self, ServerError::Internal(_))
    }
}

impl From<SignError> for ServerError {
    fn from(error: SignError) -> Self {
        classify(error)
    }
}

/// Map a streaming failure onto the response category it belongs to.
///
/// Truncated uploads and connection faults are the caller's doing; any
/// other failure is internal and keeps its detail for the operator log.
pub fn classify(error: SignError) -> ServerError {
    match error {
        SignError::TruncatedInput => ServerError::UnexpectedEof,
        SignError::ConnectionFault(_) => ServerError::SocketRead,
        SignError::Other(report) => ServerError::Internal(report),
    }
}

/// Trait implementation to convert this error into an axum http response
impl AxumCoreIntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n").into_response()
            }
            bad_request @ (ServerError::MissingParameter(_)
            | ServerError::UnexpectedEof
            | ServerError::SocketRead) => {
                (StatusCode::BAD_REQUEST, format!("{bad_request}\n")).into_response()
            }
            ServerError::AccessDenied => {
                (StatusCode::FORBIDDEN, "Access denied\n").into_response()
            }
            ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized\n").into_response()
            }
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    fn socket_error() -> SignError {
        let cause = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer");
        SignError::ConnectionFault(axum::Error::new(cause))
    }

    #[test]
    fn truncated_input_is_bad_request() {
        let error = classify(SignError::TruncatedInput);
        assert!(matches!(error, ServerError::UnexpectedEof));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn connection_fault_is_bad_request() {
        let error = classify(socket_error());
        assert!(matches!(error, ServerError::SocketRead));
        assert!(!error.is_internal());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_fault_is_internal() {
        let error = classify(SignError::Other(eyre::eyre!("bad lead magic")));
        assert!(error.is_internal());
        assert_eq!(error.to_string(), "bad lead magic");
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let first = classify(socket_error()).to_string();
        let second = classify(socket_error()).to_string();
        assert_eq!(first, second);
        assert_eq!(first, "error reading from socket");
    }

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error reading a body from connection")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn nested_unexpected_eof_is_truncated_input() {
        let cut = io::Error::new(io::ErrorKind::UnexpectedEof, "IncompleteBody");
        let error = SignError::from_body_error(axum::Error::new(Wrapped(cut)));
        assert!(matches!(error, SignError::TruncatedInput));
        assert_eq!(classify(error).to_string(), "unexpected EOF");
    }

    #[test]
    fn other_body_errors_are_connection_faults() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        let error = SignError::from_body_error(axum::Error::new(Wrapped(reset)));
        assert!(matches!(error, SignError::ConnectionFault(_)));
    }

    #[test]
    fn missing_parameter_names_the_parameter() {
        let error = ServerError::MissingParameter("key");
        assert_eq!(error.to_string(), "'key' query parameter is required");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn access_denied_returns_403() {
        let response = ServerError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn method_not_allowed_returns_405() {
        let response = ServerError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
