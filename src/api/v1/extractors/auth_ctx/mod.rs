/*!
 * Security context extractor
 *
 * Responsibility:
 * - hand the authenticated request's SecurityCtx to handlers
 * - the type itself lives in services::auth (the gate builds it)
 *
 * Public API:
 * - SecurityCtx
 * - SecurityCtxExtractor
 */

mod core;

pub use crate::services::auth::SecurityCtx;
pub use core::SecurityCtxExtractor;
