pub mod authorization;
pub mod context;
pub mod error;
pub mod expiry;
pub mod gate;
pub mod protection;
pub mod resolver;
pub mod verifier;

pub use authorization::authorize;
pub use context::SecurityCtx;
pub use error::{AuthError, Malformed};
pub use expiry::{Clock, FixedClock, SystemClock};
pub use gate::{AuthGate, GateOutcome};
pub use protection::{AccessMarker, AccessMeta, RouteInfo};
pub use resolver::{IdentityResolver, Principal};
pub use verifier::{ClaimSet, CredentialVerifier};
