//! Credential verification: HMAC-signed JWT → [`ClaimSet`].
//!
//! Only the signature and the claim shape are checked here. Expiry is a
//! separate step (see `expiry`), so `jsonwebtoken`'s own `exp` validation is
//! turned off.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::SharedSecret;
use crate::services::auth::error::{AuthError, Malformed};

/// Claims as they appear on the wire.
///
/// `exp` is read loosely so a signed token without a usable expiry is told
/// apart from one that does not parse at all.
#[derive(Debug, Clone, Deserialize)]
struct RawClaims {
    sub: String,
    // seconds since the epoch
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// Verified, decoded claims. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Verifies tokens against the shared secret.
///
/// Accepts the HMAC family (HS256/HS384/HS512). Key material is not printable via Debug.
#[derive(Clone)]
pub struct CredentialVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl CredentialVerifier {
    pub fn new(secret: &SharedSecret) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.expose());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub"]);

        Self {
            decoding_key,
            validation,
        }
    }

    /// Check the signature and decode the claim set.
    ///
    /// Fails with `MalformedCredential(Token)` when the token cannot be parsed,
    /// `SignatureInvalid` when it parses but was not signed with our secret, and
    /// `UnexpectedVerificationError` for anything else, including a correctly
    /// signed token whose `exp` is missing or out of range.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let data = jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(&e, token))?;

        let subject = data.claims.sub;
        if subject.trim().is_empty() {
            return Err(AuthError::MalformedCredential(Malformed::Token));
        }

        let expires_at = data
            .claims
            .exp
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or_else(|| unexpected("signed token carries no usable exp claim", token))?;

        Ok(ClaimSet {
            subject,
            expires_at,
        })
    }
}

fn classify(err: &jsonwebtoken::errors::Error, token: &str) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::MalformedCredential(Malformed::Token),
        // Typically a token signed before the secret was rotated (server restart
        // with a new secret) or a key/backend fault.
        _ => unexpected(&err.to_string(), token),
    }
}

fn unexpected(error: &str, token: &str) -> AuthError {
    tracing::error!(
        error,
        token_fp = %fingerprint(token),
        "unexpected token verification failure"
    );
    AuthError::UnexpectedVerificationError
}

/// Short, non-reversible token identifier for log correlation.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..6])
}
