/*
 * Responsibility
 * - public middleware surface (re-export)
 * - auth: per-operation gate + route registration with access markers
 * - http: request id / body limit / timeout / trace for the whole router
 */
pub mod auth;
pub mod http;
