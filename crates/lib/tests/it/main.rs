/*! Integration tests for Garrison.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - guard: Tests for the permission guard across whole-kernel operations
 * - lifecycle: Tests for the present/absent lifecycle and deletion cascades
 * - loading: Tests for bulk loading, partial failure and category expansion
 * - persistence: Tests for the file store round trip and archiving
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("garrison=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod guard;
mod helpers;
mod lifecycle;
mod loading;
mod persistence;
