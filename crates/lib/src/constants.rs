//! Shared constants for the store layout and permission defaults.

/// Default config group for hosts that do not declare one.
pub const DEFAULT_CONFIG_GROUP: &str = "default";

/// Default mode for a newly resolved host: owner rwx, group rw, other none.
pub const DEFAULT_HOST_MODE: u16 = 0o760;

/// Default mode for a manager collection loaded without explicit
/// permissions.
pub const DEFAULT_MANAGER_MODE: u16 = 0o660;

/// File holding the user manager's record, relative to the db directory.
pub const USERS_FILE: &str = "users.json";

/// File holding the group manager's record.
pub const GROUPS_FILE: &str = "groups.json";

/// File holding user category definitions.
pub const USER_CATEGORIES_FILE: &str = "includes/user-categories.json";

/// File holding group category definitions.
pub const GROUP_CATEGORIES_FILE: &str = "includes/group-categories.json";

/// Directory of per-host files, one subdirectory per config group.
pub const CONFIGS_DIR: &str = "configs";

/// Directory that previous generations are archived into on save.
pub const ARCHIVE_DIR: &str = "archive";
