//! The kernel: one registry owning every manager, wired together in
//! dependency order.
//!
//! Each manager declares which other managers it depends on; the kernel
//! topologically sorts those declarations once at construction and drives
//! every cross-manager operation along that order. Loads run top-down
//! (dependencies first), state cascades and purges run bottom-up
//! (dependents first), so a manager never sees a reference to an entity its
//! dependency has not loaded yet or has already discarded.

use tracing::{debug, info};

use crate::manager::{
    GroupCategoryManager, GroupManager, HostManager, ResolvedHost, SudoManager,
    UserCategoryManager, UserManager,
};
use crate::model::{Group, Presence, User};
use crate::perms::{Action, Identity, check};
use crate::records::RecordSet;
use crate::resolve::HostResolver;

pub mod errors;


pub use errors::RegistryError;

/// The managers the kernel wires together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerKind {
    Users,
    Groups,
    UserCategories,
    GroupCategories,
    Sudo,
    Hosts,
}

impl ManagerKind {
    const ALL: [ManagerKind; 6] = [
        ManagerKind::Users,
        ManagerKind::Groups,
        ManagerKind::UserCategories,
        ManagerKind::GroupCategories,
        ManagerKind::Sudo,
        ManagerKind::Hosts,
    ];

    /// The managers this manager needs loaded before it can resolve its
    /// own records.
    pub fn dependencies(self) -> &'static [ManagerKind] {
        match self {
            ManagerKind::Users => &[],
            ManagerKind::Groups => &[ManagerKind::Users],
            ManagerKind::UserCategories => &[ManagerKind::Users],
            ManagerKind::GroupCategories => &[ManagerKind::Users, ManagerKind::Groups],
            ManagerKind::Sudo => &[ManagerKind::Users, ManagerKind::Groups],
            ManagerKind::Hosts => &[
                ManagerKind::Users,
                ManagerKind::Groups,
                ManagerKind::Sudo,
                ManagerKind::UserCategories,
                ManagerKind::GroupCategories,
            ],
        }
    }
}

/// Kahn's algorithm over the manager dependency declarations. Returns the
/// kinds in an order where every manager follows its dependencies.
pub(crate) fn topo_sort(kinds: &[ManagerKind]) -> Result<Vec<ManagerKind>, RegistryError> {
    let index = |kind: ManagerKind| kinds.iter().position(|&k| k == kind);
    let mut in_degree = vec![0usize; kinds.len()];
    for (i, kind) in kinds.iter().enumerate() {
        for dep in kind.dependencies() {
            // dependencies outside the sorted set are already satisfied
            if index(*dep).is_some() {
                in_degree[i] += 1;
            }
        }
    }

    let mut ready: Vec<usize> = (0..kinds.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(kinds.len());
    while let Some(i) = ready.pop() {
        order.push(kinds[i]);
        for (j, kind) in kinds.iter().enumerate() {
            if kind.dependencies().contains(&kinds[i]) {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(j);
                }
            }
        }
    }
    if order.len() != kinds.len() {
        return Err(RegistryError::DependencyCycle);
    }
    Ok(order)
}

/// The outcome of one full load: per-manager entity counts plus every
/// non-fatal error the load skipped past.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub users: usize,
    pub groups: usize,
    pub user_categories: usize,
    pub group_categories: usize,
    pub hosts: usize,
    pub errors: Vec<String>,
}

/// The configuration kernel: exclusive owner of every manager.
///
/// All mutation goes through `&mut self`, so the kernel is the single
/// writer over the whole entity graph; concurrent readers wrap it in
/// whatever lock the embedding program prefers.
#[derive(Debug)]
pub struct Kernel {
    users: UserManager,
    groups: GroupManager,
    sudo: SudoManager,
    user_categories: UserCategoryManager,
    group_categories: GroupCategoryManager,
    hosts: HostManager,
    order: Vec<ManagerKind>,
}

impl Kernel {
    /// Build an empty kernel. Fails only if the static dependency
    /// declarations are cyclic.
    pub fn new(identity: &Identity) -> crate::Result<Self> {
        let order = topo_sort(&ManagerKind::ALL)?;
        debug!(?order, "manager load order");
        Ok(Kernel {
            users: UserManager::new(identity),
            groups: GroupManager::new(identity),
            sudo: SudoManager::new(identity),
            user_categories: UserCategoryManager::new(identity),
            group_categories: GroupCategoryManager::new(identity),
            hosts: HostManager::new(identity),
            order,
        })
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserManager {
        &mut self.users
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut GroupManager {
        &mut self.groups
    }

    pub fn sudo(&self) -> &SudoManager {
        &self.sudo
    }

    pub fn sudo_mut(&mut self) -> &mut SudoManager {
        &mut self.sudo
    }

    pub fn user_categories(&self) -> &UserCategoryManager {
        &self.user_categories
    }

    pub fn user_categories_mut(&mut self) -> &mut UserCategoryManager {
        &mut self.user_categories
    }

    pub fn group_categories(&self) -> &GroupCategoryManager {
        &self.group_categories
    }

    pub fn group_categories_mut(&mut self) -> &mut GroupCategoryManager {
        &mut self.group_categories
    }

    pub fn hosts(&self) -> &HostManager {
        &self.hosts
    }

    pub fn hosts_mut(&mut self) -> &mut HostManager {
        &mut self.hosts
    }

    /// The manager load order the kernel derived from the dependency
    /// declarations.
    pub fn order(&self) -> &[ManagerKind] {
        &self.order
    }

    /// Load a full record set, dependencies first. Bad records are skipped
    /// and reported; only an access failure aborts the load.
    pub fn load_all(&mut self, loader: &Identity, records: &RecordSet) -> crate::Result<LoadReport> {
        let mut report = LoadReport::default();
        let order = self.order.clone();
        for kind in order {
            match kind {
                ManagerKind::Users => {
                    if let Some(record) = &records.users {
                        check(loader, self.users.meta(), Action::Write)?;
                        report.users = self.users.load_records(record);
                        report.errors.extend(self.users.load_errors().to_vec());
                    }
                }
                ManagerKind::Groups => {
                    if let Some(record) = &records.groups {
                        check(loader, self.groups.meta(), Action::Write)?;
                        report.groups = self.groups.load_records(record);
                        report.errors.extend(self.groups.load_errors().to_vec());
                    }
                }
                ManagerKind::UserCategories => {
                    report.user_categories =
                        self.user_categories.load_records(&records.user_categories);
                    report
                        .errors
                        .extend(self.user_categories.load_errors().to_vec());
                }
                ManagerKind::GroupCategories => {
                    report.group_categories = self
                        .group_categories
                        .load_records(&records.group_categories);
                    report
                        .errors
                        .extend(self.group_categories.load_errors().to_vec());
                }
                // sudo rules have no standalone file; hosts declare them inline
                ManagerKind::Sudo => {}
                ManagerKind::Hosts => {
                    for record in &records.hosts {
                        let resolver = HostResolver {
                            users: &self.users,
                            groups: &self.groups,
                            sudo: &self.sudo,
                            user_categories: &self.user_categories,
                            group_categories: &self.group_categories,
                        };
                        match resolver.resolve(loader, record) {
                            Ok((host, ledger)) => {
                                report.errors.extend(ledger.messages());
                                match self.hosts.insert(ResolvedHost { host, ledger }) {
                                    Ok(()) => report.hosts += 1,
                                    Err(e) => {
                                        report.errors.push(format!("Error validating host. {e}"));
                                    }
                                }
                            }
                            Err(e) => {
                                report.errors.push(format!("Error validating host. {e}"));
                            }
                        }
                    }
                }
            }
        }
        info!(
            users = report.users,
            groups = report.groups,
            hosts = report.hosts,
            errors = report.errors.len(),
            "load complete"
        );
        Ok(report)
    }

    /// Change a user's state. Marking a user absent cascades: the user's
    /// host accounts, key grants, group memberships and sudo grants all go
    /// absent with it, but no record is removed.
    pub fn set_user_state(
        &mut self,
        identity: &Identity,
        name: &str,
        state: Presence,
    ) -> crate::Result<bool> {
        check(identity, self.users.meta(), Action::Write)?;
        let changed = self
            .users
            .set_state(name, state)
            .ok_or(RegistryError::UnknownEntity {
                kind: "user",
                name: name.to_string(),
            })?;
        if changed && state == Presence::Absent {
            // dependents first
            self.hosts.on_user_state(name, state);
            self.sudo.on_user_state(name, state);
            info!(user = name, "user marked absent, references flipped");
        }
        Ok(changed)
    }

    /// Change a group's state, cascading absence into host bindings and
    /// sudo grants.
    pub fn set_group_state(
        &mut self,
        identity: &Identity,
        name: &str,
        state: Presence,
    ) -> crate::Result<bool> {
        check(identity, self.groups.meta(), Action::Write)?;
        let changed = self
            .groups
            .set_state(name, state)
            .ok_or(RegistryError::UnknownEntity {
                kind: "group",
                name: name.to_string(),
            })?;
        if changed && state == Presence::Absent {
            self.hosts.on_group_state(name, state);
            self.sudo.on_group_state(name, state);
            info!(group = name, "group marked absent, references flipped");
        }
        Ok(changed)
    }

    /// Delete a user outright. Refused while any present record still
    /// references the user; once everything referencing it is absent, the
    /// user is purged from every manager, dependents first.
    pub fn delete_user(&mut self, identity: &Identity, name: &str) -> crate::Result<User> {
        check(identity, self.users.meta(), Action::Write)?;
        if self.users.get(name).is_none() {
            return Err(RegistryError::UnknownEntity {
                kind: "user",
                name: name.to_string(),
            }
            .into());
        }
        let mut references = self.hosts.hosts_referencing_user(name);
        if self.sudo.user_referenced_present(name) {
            references.push("the sudo registry".to_string());
        }
        if !references.is_empty() {
            return Err(RegistryError::ReferencedWhilePresent {
                kind: "user",
                name: name.to_string(),
                references,
            }
            .into());
        }
        self.hosts.purge_user(name);
        self.sudo.purge_user(name);
        self.group_categories.purge_user(name);
        self.user_categories.purge_user(name);
        let user = self
            .users
            .remove(name)
            .ok_or(RegistryError::UnknownEntity {
                kind: "user",
                name: name.to_string(),
            })?;
        info!(user = name, "user deleted and purged");
        Ok(user)
    }

    /// Delete a group outright, with the same refusal rule as
    /// [`Kernel::delete_user`].
    pub fn delete_group(&mut self, identity: &Identity, name: &str) -> crate::Result<Group> {
        check(identity, self.groups.meta(), Action::Write)?;
        if self.groups.get(name).is_none() {
            return Err(RegistryError::UnknownEntity {
                kind: "group",
                name: name.to_string(),
            }
            .into());
        }
        let mut references = self.hosts.hosts_referencing_group(name);
        if self.sudo.group_referenced_present(name) {
            references.push("the sudo registry".to_string());
        }
        if !references.is_empty() {
            return Err(RegistryError::ReferencedWhilePresent {
                kind: "group",
                name: name.to_string(),
                references,
            }
            .into());
        }
        self.hosts.purge_group(name);
        self.sudo.purge_group(name);
        self.group_categories.purge_group(name);
        let group = self
            .groups
            .remove(name)
            .ok_or(RegistryError::UnknownEntity {
                kind: "group",
                name: name.to_string(),
            })?;
        info!(group = name, "group deleted and purged");
        Ok(group)
    }

    /// Add a host from a raw record, resolving it against the current
    /// entity state.
    pub fn add_host(
        &mut self,
        identity: &Identity,
        record: &crate::records::HostRecord,
    ) -> crate::Result<()> {
        check(identity, self.hosts.meta(), Action::Write)?;
        let resolver = HostResolver {
            users: &self.users,
            groups: &self.groups,
            sudo: &self.sudo,
            user_categories: &self.user_categories,
            group_categories: &self.group_categories,
        };
        let (host, ledger) = resolver.resolve(identity, record)?;
        self.hosts.insert(ResolvedHost { host, ledger })?;
        Ok(())
    }

    /// Every resolved host together with its error ledger, in key order.
    /// This is the exporter's entry point; host-level read access is the
    /// exporter's concern, so no identity is threaded here.
    pub fn hosts_with_ledgers(&self) -> impl Iterator<Item = &ResolvedHost> {
        self.hosts.resolved()
    }

    /// Snapshot the full entity state back into persistable records.
    pub fn export_all(&self, identity: &Identity) -> crate::Result<RecordSet> {
        Ok(RecordSet {
            users: Some(self.users.export(identity)?),
            groups: Some(self.groups.export(identity)?),
            user_categories: self.user_categories.export(identity)?,
            group_categories: self.group_categories.export(identity)?,
            hosts: self
                .hosts
                .hosts(identity)?
                .into_iter()
                .map(crate::records::HostRecord::from_model)
                .collect(),
        })
    }
}
