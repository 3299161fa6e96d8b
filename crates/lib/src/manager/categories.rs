//! Reusable include categories.
//!
//! Categories are templates: their account and binding lists are stored
//! verbatim and only resolved against the valid user and group lists when a
//! host includes them.

use std::collections::BTreeMap;

use tracing::warn;

use super::{ManagerError, ManagerMeta};
use crate::model::{GroupCategory, UserCategory};
use crate::perms::{Action, Identity, check};
use crate::records::{GroupCategoryRecord, UserCategoryRecord};

#[derive(Debug)]
pub struct UserCategoryManager {
    meta: ManagerMeta,
    categories: BTreeMap<String, UserCategory>,
    errors: Vec<String>,
}

impl UserCategoryManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        UserCategoryManager {
            meta: ManagerMeta::new("user category manager", identity),
            categories: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    pub fn load_errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn add(&mut self, identity: &Identity, category: UserCategory) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(category)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, category: UserCategory) -> Result<(), ManagerError> {
        if self.categories.contains_key(category.name()) {
            return Err(ManagerError::DuplicateName {
                kind: "user category",
                name: category.name().to_string(),
            });
        }
        self.categories.insert(category.name().to_string(), category);
        Ok(())
    }

    pub fn find(&self, identity: &Identity, name: &str) -> crate::Result<Option<&UserCategory>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.categories.get(name))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&UserCategory> {
        self.categories.get(name)
    }

    pub(crate) fn load_records(&mut self, records: &[UserCategoryRecord]) -> usize {
        let mut loaded = 0;
        for record in records {
            match record.to_model() {
                Ok((category, issues)) => {
                    for issue in issues {
                        warn!("user category '{}': {issue}", category.name());
                        self.errors
                            .push(format!("Error validating user category. {issue}"));
                    }
                    match self.insert(category) {
                        Ok(()) => loaded += 1,
                        Err(e) => {
                            warn!("error validating user category: {e}");
                            self.errors
                                .push(format!("Error validating user category. {e}"));
                        }
                    }
                }
                Err(e) => {
                    warn!("error validating user category: {e}");
                    self.errors
                        .push(format!("Error validating user category. {e}"));
                }
            }
        }
        loaded
    }

    pub fn export(&self, identity: &Identity) -> crate::Result<Vec<UserCategoryRecord>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self
            .categories
            .values()
            .map(UserCategoryRecord::from_model)
            .collect())
    }

    pub(crate) fn purge_user(&mut self, user: &str) {
        for category in self.categories.values_mut() {
            category.purge_user(user);
        }
    }
}

#[derive(Debug)]
pub struct GroupCategoryManager {
    meta: ManagerMeta,
    categories: BTreeMap<String, GroupCategory>,
    errors: Vec<String>,
}

impl GroupCategoryManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        GroupCategoryManager {
            meta: ManagerMeta::new("group category manager", identity),
            categories: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    pub fn load_errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn add(&mut self, identity: &Identity, category: GroupCategory) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(category)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, category: GroupCategory) -> Result<(), ManagerError> {
        if self.categories.contains_key(category.name()) {
            return Err(ManagerError::DuplicateName {
                kind: "group category",
                name: category.name().to_string(),
            });
        }
        self.categories.insert(category.name().to_string(), category);
        Ok(())
    }

    pub fn find(&self, identity: &Identity, name: &str) -> crate::Result<Option<&GroupCategory>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.categories.get(name))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&GroupCategory> {
        self.categories.get(name)
    }

    pub(crate) fn load_records(&mut self, records: &[GroupCategoryRecord]) -> usize {
        let mut loaded = 0;
        for record in records {
            match record.to_model() {
                Ok((category, issues)) => {
                    for issue in issues {
                        warn!("group category '{}': {issue}", category.name());
                        self.errors
                            .push(format!("Error validating group category. {issue}"));
                    }
                    match self.insert(category) {
                        Ok(()) => loaded += 1,
                        Err(e) => {
                            warn!("error validating group category: {e}");
                            self.errors
                                .push(format!("Error validating group category. {e}"));
                        }
                    }
                }
                Err(e) => {
                    warn!("error validating group category: {e}");
                    self.errors
                        .push(format!("Error validating group category. {e}"));
                }
            }
        }
        loaded
    }

    pub fn export(&self, identity: &Identity) -> crate::Result<Vec<GroupCategoryRecord>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self
            .categories
            .values()
            .map(GroupCategoryRecord::from_model)
            .collect())
    }

    pub(crate) fn purge_user(&mut self, user: &str) {
        for category in self.categories.values_mut() {
            category.purge_user(user);
        }
    }

    pub(crate) fn purge_group(&mut self, group: &str) {
        for category in self.categories.values_mut() {
            category.purge_group(group);
        }
    }
}
