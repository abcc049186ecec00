use axum::http::StatusCode;
use thiserror::Error;

/// Which part of the credential could not be understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// The header is not `Bearer <token>`.
    Scheme,
    /// The token is not a well-formed signed claim set.
    Token,
}

/// Every way the gate (and the marker check after it) can reject a request.
///
/// All variants are terminal: the request is answered with [`AuthError::status`]
/// and [`AuthError::reason`] and never reaches the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed credential ({0:?})")]
    MalformedCredential(Malformed),
    #[error("signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("principal not found")]
    PrincipalNotFound,
    #[error("unexpected verification error")]
    UnexpectedVerificationError,
    #[error("access denied")]
    AccessDenied,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential(Malformed::Scheme)
            | AuthError::TokenExpired
            | AuthError::UnexpectedVerificationError => StatusCode::UNAUTHORIZED,
            AuthError::MalformedCredential(Malformed::Token)
            | AuthError::SignatureInvalid
            | AuthError::PrincipalNotFound
            | AuthError::AccessDenied => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Never includes token or key material.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "No authorization header provided",
            AuthError::MalformedCredential(Malformed::Scheme) => {
                "Authorization header must use the Bearer scheme"
            }
            AuthError::MalformedCredential(Malformed::Token)
            | AuthError::SignatureInvalid
            | AuthError::AccessDenied => "You are not authorized to perform this action",
            AuthError::TokenExpired => {
                "Your authorization token has timed out, please login again"
            }
            AuthError::PrincipalNotFound => {
                "User could not be authenticated via the provided token"
            }
            AuthError::UnexpectedVerificationError => {
                "Your authorization token was not valid (try and login again)"
            }
        }
    }
}
