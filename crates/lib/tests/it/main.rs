/*! Integration tests for Userdao.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - permissions: Tests for the bitmask permission model
 * - backend: Tests for configuration resolution and the repository implementations
 * - provider: Tests for readiness and background initialization
 * - commands: Tests for the administrative commands and the dispatch error boundary
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("userdao=info")),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod helpers;
mod permissions;
mod provider;
