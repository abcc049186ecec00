/*
 * Responsibility
 * - the identity store contract (subject -> display name + roles)
 * - backends: in-memory, Postgres, and a Valkey read-through cache in front of either
 */
pub mod cached;
pub mod postgres;
pub mod store;

pub use cached::CachedIdentityStore;
pub use postgres::PgIdentityStore;
pub use store::{IdentityStore, IdentityStoreError, InMemoryIdentityStore, UserRecord};
