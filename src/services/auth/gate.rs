//! The per-request authentication gate.
//!
//! classify → extract bearer → verify signature → check expiry → resolve identity.
//! Each step either advances or ends the request with an [`AuthError`]; a
//! [`SecurityCtx`] exists only when every step succeeded.
use axum::http::{HeaderMap, header};
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::context::SecurityCtx;
use crate::services::auth::error::{AuthError, Malformed};
use crate::services::auth::expiry::{Clock, SystemClock, is_expired};
use crate::services::auth::protection::RouteInfo;
use crate::services::auth::resolver::IdentityResolver;
use crate::services::auth::verifier::{CredentialVerifier, fingerprint};
use crate::services::identity::IdentityStore;

const BEARER: &str = "Bearer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No markers on the operation or its resource; the request is untouched.
    Unprotected,
    Authenticated(SecurityCtx),
}

/// Holds no per-request state; safe to share across concurrent requests.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<CredentialVerifier>,
    resolver: IdentityResolver,
    clock: Arc<dyn Clock>,
    trust_forwarded_proto: bool,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("verifier", &self.verifier)
            .field("resolver", &self.resolver)
            .field("trust_forwarded_proto", &self.trust_forwarded_proto)
            .finish()
    }
}

impl AuthGate {
    pub fn new(
        verifier: CredentialVerifier,
        resolver: IdentityResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            resolver,
            clock,
            trust_forwarded_proto: false,
        }
    }

    /// Wire the gate from application config with the system clock.
    pub fn from_config(config: &Config, identity: Arc<dyn IdentityStore>) -> Self {
        Self::new(
            CredentialVerifier::new(&config.shared_secret),
            IdentityResolver::new(identity, config.identity_lookup_timeout),
            Arc::new(SystemClock),
        )
        .with_forwarded_proto(config.trust_forwarded_proto)
    }

    /// Whether `X-Forwarded-Proto` may mark a request as secure. Off by default.
    pub fn with_forwarded_proto(mut self, trust: bool) -> Self {
        self.trust_forwarded_proto = trust;
        self
    }

    pub fn trusts_forwarded_proto(&self) -> bool {
        self.trust_forwarded_proto
    }

    pub async fn authenticate(
        &self,
        route: &RouteInfo,
        headers: &HeaderMap,
        secure: bool,
    ) -> Result<GateOutcome, AuthError> {
        if !route.is_protected() {
            return Ok(GateOutcome::Unprotected);
        }

        let token = bearer_token(headers)?;

        let claims = self.verifier.verify(token)?;

        if is_expired(&claims, self.clock.now()) {
            tracing::debug!(token_fp = %fingerprint(token), "token expired");
            return Err(AuthError::TokenExpired);
        }

        let principal = self.resolver.resolve(&claims.subject).await?;

        Ok(GateOutcome::Authenticated(SecurityCtx::new(principal, secure)))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme name is matched case-insensitively. A header that is present but
/// does not carry a bearer token is malformed, not missing.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential(Malformed::Scheme))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential(Malformed::Scheme))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() {
        return Err(AuthError::MalformedCredential(Malformed::Scheme));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SharedSecret;
    use crate::services::auth::expiry::FixedClock;
    use crate::services::auth::protection::{AccessMarker, AccessMeta};
    use crate::services::identity::{InMemoryIdentityStore, UserRecord};
    use axum::http::HeaderValue;
    use chrono::{DateTime, TimeDelta, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::json;
    use std::time::Duration;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn gate_at(at: DateTime<Utc>) -> AuthGate {
        let store = InMemoryIdentityStore::new()
            .with_user("u1", UserRecord::new("Alice", ["admin", "user"]))
            .with_user("u2", UserRecord::new("Bob", ["user"]));

        AuthGate::new(
            CredentialVerifier::new(&SharedSecret::new(SECRET)),
            IdentityResolver::new(Arc::new(store), Duration::from_secs(1)),
            Arc::new(FixedClock(at)),
        )
    }

    fn mint(secret: &[u8], sub: &str, exp: i64) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": sub, "exp": exp}),
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    fn protected() -> RouteInfo {
        RouteInfo::new(AccessMeta::none(), AccessMarker::PermitAll.into())
    }

    fn expect_ctx(outcome: GateOutcome) -> SecurityCtx {
        match outcome {
            GateOutcome::Authenticated(ctx) => ctx,
            GateOutcome::Unprotected => panic!("expected an authenticated outcome"),
        }
    }

    #[tokio::test]
    async fn unprotected_route_ignores_credentials_entirely() {
        let gate = gate_at(now());
        let open = RouteInfo::default();

        for h in [
            HeaderMap::new(),
            headers("garbage"),
            headers("Bearer not.a.jwt"),
            headers(&format!("Bearer {}", mint(b"wrong", "u1", NOW))),
        ] {
            assert_eq!(
                gate.authenticate(&open, &h, false).await,
                Ok(GateOutcome::Unprotected)
            );
        }
    }

    #[test]
    fn forwarded_proto_is_untrusted_unless_enabled() {
        assert!(!gate_at(now()).trusts_forwarded_proto());
        assert!(gate_at(now()).with_forwarded_proto(true).trusts_forwarded_proto());
    }

    #[tokio::test]
    async fn missing_header_is_missing_credential() {
        let result = gate_at(now())
            .authenticate(&protected(), &HeaderMap::new(), false)
            .await;
        assert_eq!(result, Err(AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn wrong_scheme_is_malformed_not_a_panic() {
        let gate = gate_at(now());
        let token = mint(SECRET, "u1", NOW + 60);

        for value in [
            "Basic dXNlcjpwYXNz".to_string(),
            token.clone(),
            "Bearer".to_string(),
            "Bearer    ".to_string(),
            "B".to_string(),
        ] {
            assert_eq!(
                gate.authenticate(&protected(), &headers(&value), false).await,
                Err(AuthError::MalformedCredential(Malformed::Scheme)),
                "{value:?}"
            );
        }
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let token = mint(SECRET, "u1", NOW + 60);
        let outcome = gate_at(now())
            .authenticate(&protected(), &headers(&format!("bearer {token}")), false)
            .await
            .unwrap();
        assert_eq!(expect_ctx(outcome).principal().name(), "Alice");
    }

    #[tokio::test]
    async fn unparsable_token_is_malformed() {
        let result = gate_at(now())
            .authenticate(&protected(), &headers("Bearer abc.def"), false)
            .await;
        assert_eq!(result, Err(AuthError::MalformedCredential(Malformed::Token)));
    }

    #[tokio::test]
    async fn foreign_signature_is_rejected_before_anything_else() {
        // expired and unknown subject too, but the signature decides
        let token = mint(b"another-secret-another-secret-xx", "ghost", NOW - 3600);
        let result = gate_at(now())
            .authenticate(&protected(), &headers(&format!("Bearer {token}")), false)
            .await;
        assert_eq!(result, Err(AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn expiry_boundary_is_inclusive() {
        let token = mint(SECRET, "u1", NOW);
        let h = headers(&format!("Bearer {token}"));

        let at_boundary = gate_at(now()).authenticate(&protected(), &h, false).await;
        assert!(matches!(at_boundary, Ok(GateOutcome::Authenticated(_))));

        let one_tick_later = gate_at(now() + TimeDelta::milliseconds(1))
            .authenticate(&protected(), &h, false)
            .await;
        assert_eq!(one_tick_later, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn unknown_subject_is_principal_not_found() {
        let token = mint(SECRET, "ghost", NOW + 60);
        let result = gate_at(now())
            .authenticate(&protected(), &headers(&format!("Bearer {token}")), false)
            .await;
        assert_eq!(result, Err(AuthError::PrincipalNotFound));
    }

    #[tokio::test]
    async fn success_binds_principal_with_exact_roles() {
        let token = mint(SECRET, "u1", NOW + 60);
        let outcome = gate_at(now())
            .authenticate(&protected(), &headers(&format!("Bearer {token}")), true)
            .await
            .unwrap();

        let ctx = expect_ctx(outcome);
        assert_eq!(ctx.principal().name(), "Alice");
        assert_eq!(
            ctx.principal()
                .roles()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            vec!["admin", "user"]
        );
        assert!(ctx.is_in_role("admin"));
        assert!(!ctx.is_in_role("ops"));
        assert!(ctx.is_secure());
    }

    #[tokio::test]
    async fn resource_marker_alone_triggers_authentication() {
        let route = RouteInfo::new(AccessMarker::DenyAll.into(), AccessMeta::none());
        let result = gate_at(now())
            .authenticate(&route, &HeaderMap::new(), false)
            .await;
        assert_eq!(result, Err(AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn same_input_same_outcome() {
        let gate = gate_at(now());
        let good = headers(&format!("Bearer {}", mint(SECRET, "u2", NOW + 60)));
        let bad = headers(&format!("Bearer {}", mint(SECRET, "u2", NOW - 1)));

        let first = gate.authenticate(&protected(), &good, false).await;
        let second = gate.authenticate(&protected(), &good, false).await;
        assert_eq!(first, second);

        let first = gate.authenticate(&protected(), &bad, false).await;
        let second = gate.authenticate(&protected(), &bad, false).await;
        assert_eq!(first, second);
        assert_eq!(first, Err(AuthError::TokenExpired));
    }

    #[test]
    fn bearer_token_trims_surrounding_space() {
        assert_eq!(bearer_token(&headers("Bearer  abc ")), Ok("abc"));
    }
}
