//! Exporter boundary.
//!
//! The kernel never generates engine-specific artifacts itself. An external
//! adapter implements [`ArtifactWriter`] and is handed each resolved host
//! together with its error ledger; what it writes (playbooks, inventories,
//! reports) is its own business.

use tracing::debug;

use crate::model::Host;
use crate::perms::{Action, Identity, allows};
use crate::registry::Kernel;
use crate::resolve::Ledger;

/// Implemented by adapters that turn resolved hosts into external
/// artifacts.
pub trait ArtifactWriter {
    /// Called once per exported host. The ledger lists everything that was
    /// skipped when the host was resolved, so the adapter can decide
    /// whether a degraded host is still worth emitting.
    fn write_host(&mut self, host: &Host, ledger: &Ledger) -> crate::Result<()>;
}

/// Walk every host the identity may read and hand it to the writer. Hosts
/// the identity cannot read are skipped silently, matching the listing
/// behavior. Returns the number of hosts written.
pub fn export_hosts(
    kernel: &Kernel,
    identity: &Identity,
    writer: &mut impl ArtifactWriter,
) -> crate::Result<usize> {
    let mut written = 0;
    for resolved in kernel.hosts_with_ledgers() {
        if !allows(identity, &resolved.host, Action::Read) {
            debug!(host = resolved.host.name(), "skipping unreadable host");
            continue;
        }
        writer.write_host(&resolved.host, &resolved.ledger)?;
        written += 1;
    }
    Ok(written)
}
