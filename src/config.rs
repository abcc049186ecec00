/*
 * Responsibility
 * - read settings from the environment (shared secret, identity backend, HTTP limits)
 * - validate them (startup fails when something required is missing)
 * - keep the shared secret out of Debug output
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// HMAC keys shorter than this are rejected at startup (256 bits for HS256).
pub const MIN_SHARED_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Memory,
    Postgres,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The process-wide token verification key.
///
/// Set once at startup and never mutated. Key material is not printable via Debug.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub shared_secret: SharedSecret,

    pub identity_backend: IdentityBackend,
    pub database_url: Option<String>,
    // memory backend only: `id:name:role1|role2;id2:name2:`
    pub identity_seed: String,
    pub identity_lookup_timeout: Duration,

    pub valkey_url: Option<String>,
    pub identity_cache_ttl: Duration,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
    // honour X-Forwarded-Proto only behind a proxy that sets it
    pub trust_forwarded_proto: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let shared_secret = lookup("AUTH_SHARED_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AUTH_SHARED_SECRET"))?;
        if shared_secret.len() < MIN_SHARED_SECRET_BYTES {
            return Err(ConfigError::Invalid("AUTH_SHARED_SECRET"));
        }
        let shared_secret = SharedSecret::new(shared_secret.into_bytes());

        let identity_backend = match lookup("IDENTITY_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => IdentityBackend::Memory,
            "postgres" | "pg" => IdentityBackend::Postgres,
            _ => return Err(ConfigError::Invalid("IDENTITY_BACKEND")),
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if identity_backend == IdentityBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let identity_seed = lookup("IDENTITY_SEED").unwrap_or_default();

        let identity_lookup_timeout = Duration::from_millis(parse_or(
            &lookup,
            "IDENTITY_LOOKUP_TIMEOUT_MS",
            2_000,
        )?);

        let valkey_url = lookup("VALKEY_URL").filter(|s| !s.trim().is_empty());

        let identity_cache_ttl =
            Duration::from_secs(parse_or(&lookup, "IDENTITY_CACHE_TTL_SECONDS", 30)?);

        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);

        let request_body_limit_bytes =
            parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)? as usize;

        let trust_forwarded_proto = match lookup("TRUST_FORWARDED_PROTO")
            .map(|raw| raw.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(_) => return Err(ConfigError::Invalid("TRUST_FORWARDED_PROTO")),
        };

        Ok(Self {
            addr,
            app_env,
            shared_secret,
            identity_backend,
            database_url,
            identity_seed,
            identity_lookup_timeout,
            valkey_url,
            identity_cache_ttl,
            request_timeout,
            request_body_limit_bytes,
            trust_forwarded_proto,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("AUTH_SHARED_SECRET", SECRET)]).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.identity_backend, IdentityBackend::Memory);
        assert_eq!(config.identity_lookup_timeout, Duration::from_secs(2));
        assert_eq!(config.identity_cache_ttl, Duration::from_secs(30));
        assert_eq!(config.request_body_limit_bytes, 1024 * 1024);
        assert!(config.valkey_url.is_none());
        assert!(!config.trust_forwarded_proto);
    }

    #[test]
    fn forwarded_proto_trust_is_opt_in() {
        let config = load(&[
            ("AUTH_SHARED_SECRET", SECRET),
            ("TRUST_FORWARDED_PROTO", "TRUE"),
        ])
        .unwrap();
        assert!(config.trust_forwarded_proto);

        let err = load(&[
            ("AUTH_SHARED_SECRET", SECRET),
            ("TRUST_FORWARDED_PROTO", "maybe"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("TRUST_FORWARDED_PROTO"));
    }

    #[test]
    fn secret_is_required_and_must_be_long_enough() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("AUTH_SHARED_SECRET")
        );
        assert_eq!(
            load(&[("AUTH_SHARED_SECRET", "short")]).unwrap_err(),
            ConfigError::Invalid("AUTH_SHARED_SECRET")
        );
    }

    #[test]
    fn postgres_backend_needs_database_url() {
        let err = load(&[
            ("AUTH_SHARED_SECRET", SECRET),
            ("IDENTITY_BACKEND", "postgres"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let config = load(&[
            ("AUTH_SHARED_SECRET", SECRET),
            ("IDENTITY_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ])
        .unwrap();
        assert_eq!(config.identity_backend, IdentityBackend::Postgres);
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let err = load(&[
            ("AUTH_SHARED_SECRET", SECRET),
            ("IDENTITY_LOOKUP_TIMEOUT_MS", "soon"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("IDENTITY_LOOKUP_TIMEOUT_MS"));
    }

    #[test]
    fn debug_output_never_contains_the_secret() {
        let config = load(&[("AUTH_SHARED_SECRET", SECRET), ("APP_ENV", "prod")]).unwrap();
        let printed = format!("{:?}", config);

        assert!(config.app_env.is_production());
        assert!(!printed.contains(SECRET));
        assert!(printed.contains("<redacted>"));
    }
}
