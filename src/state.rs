/*
 * Responsibility
 * - the shared context bound to the Router (AppState)
 *   - gate: verifier + identity resolver, built once at startup
 *   - identity: the store behind the resolver (admin lookups read it directly)
 * - cheap to Clone (Arc inside)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::services::{auth::AuthGate, identity::IdentityStore};

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub identity: Arc<dyn IdentityStore>,
}

impl AppState {
    pub fn new(gate: AuthGate, identity: Arc<dyn IdentityStore>) -> Self {
        Self { gate, identity }
    }

    pub fn from_config(config: &Config, identity: Arc<dyn IdentityStore>) -> Self {
        let gate = AuthGate::from_config(config, identity.clone());
        Self::new(gate, identity)
    }
}
