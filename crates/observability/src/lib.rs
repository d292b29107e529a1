//! Shared tracing/logging setup for the storefront binaries.

/// Initialize process-wide observability (tracing/logging).
///
/// Call once at the top of `main`; repeated calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filter + subscriber).
pub mod tracing;
