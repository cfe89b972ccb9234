//! User and Role records.
//!
//! # Invariants
//! - A user is valid only with at least one role.
//! - Stored role names always carry the [`ROLE_PREFIX`].
//! - Roles cannot exist without their user; `Role::username` is the
//!   back-reference, populated once the role is attached.

use crate::model::{EntityId, Identity, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix every persisted role name carries.
pub const ROLE_PREFIX: &str = "ROLE_";

static ROLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("role name pattern is valid"));

/// Lifecycle tag for naturally keyed entities.
///
/// A user's key (the username) exists before the first save, so presence of
/// the key cannot tell "new" from "persisted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    New,
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(skip)]
    id: Identity,
    pub name: String,
    #[serde(skip)]
    username: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identity::New,
            name: name.into(),
            username: None,
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id.id()
    }

    /// Username of the owning user, once attached.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub(crate) fn attach_to_user(&mut self, username: &str) {
        if self.username.is_none() {
            self.username = Some(username.to_string());
        }
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
    }

    /// Role rows are keyed by `(username, name)`; the id follows that row,
    /// so a renamed role takes the id of its new row.
    pub(crate) fn reset_id(&mut self, id: EntityId) {
        self.id = Identity::Persisted(id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub enabled: bool,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(skip)]
    lifecycle: Lifecycle,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>, enabled: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            enabled,
            roles: Vec::new(),
            lifecycle: Lifecycle::New,
        }
    }

    pub fn is_new(&self) -> bool {
        self.lifecycle == Lifecycle::New
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Adds a role by name and attaches it to this user.
    pub fn add_role(&mut self, name: impl Into<String>) {
        let mut role = Role::new(name);
        role.attach_to_user(&self.username);
        self.roles.push(role);
    }

    /// Drops every role named `name`; returns whether any was removed.
    pub fn remove_role(&mut self, name: &str) -> bool {
        let before = self.roles.len();
        self.roles.retain(|role| role.name != name);
        self.roles.len() != before
    }

    /// Normalizes every role name and completes role back-references.
    ///
    /// Fails without touching any role when one name is invalid.
    pub fn normalize_roles(&mut self) -> Result<(), ValidationError> {
        let normalized = self
            .roles
            .iter()
            .map(|role| normalize_role_name(&role.name))
            .collect::<Result<Vec<_>, _>>()?;
        for (role, name) in self.roles.iter_mut().zip(normalized) {
            role.name = name;
            role.attach_to_user(&self.username);
        }
        Ok(())
    }

    /// Checks the invariants a user must hold before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::BlankField("user.username"));
        }
        if self.roles.is_empty() {
            return Err(ValidationError::MissingRoles);
        }
        for role in &self.roles {
            if !role.name.starts_with(ROLE_PREFIX) || !ROLE_NAME_PATTERN.is_match(&role.name) {
                return Err(ValidationError::InvalidRoleName(role.name.clone()));
            }
        }
        Ok(())
    }

    pub(crate) fn roles_mut(&mut self) -> &mut [Role] {
        &mut self.roles
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.lifecycle = Lifecycle::Persisted;
    }

    /// Rebuilds a stored user; roles come back already normalized.
    pub(crate) fn restore(
        username: String,
        password: String,
        enabled: bool,
        roles: Vec<(EntityId, String)>,
    ) -> Self {
        let mut user = Self::new(username, password, enabled);
        for (id, name) in roles {
            user.add_role(name);
            if let Some(role) = user.roles.last_mut() {
                role.assign_id(id);
            }
        }
        user.mark_persisted();
        user
    }
}

/// Normalizes a role name to the stored `ROLE_` form.
///
/// Input is trimmed and upper-cased; the prefix is added when absent.
pub fn normalize_role_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if !ROLE_NAME_PATTERN.is_match(trimmed) {
        return Err(ValidationError::InvalidRoleName(name.to_string()));
    }
    let upper = trimmed.to_ascii_uppercase();
    if upper.starts_with(ROLE_PREFIX) {
        if upper.len() == ROLE_PREFIX.len() {
            return Err(ValidationError::InvalidRoleName(name.to_string()));
        }
        return Ok(upper);
    }
    Ok(format!("{ROLE_PREFIX}{upper}"))
}

#[cfg(test)]
mod tests {
    use super::{normalize_role_name, User};
    use crate::model::ValidationError;

    #[test]
    fn normalize_adds_prefix_once() {
        assert_eq!(normalize_role_name("OWNER_ADMIN").unwrap(), "ROLE_OWNER_ADMIN");
        assert_eq!(normalize_role_name(" vet_admin ").unwrap(), "ROLE_VET_ADMIN");
        assert_eq!(normalize_role_name("ROLE_ADMIN").unwrap(), "ROLE_ADMIN");
    }

    #[test]
    fn normalize_rejects_invalid_names() {
        assert!(normalize_role_name("").is_err());
        assert!(normalize_role_name("owner admin").is_err());
        assert!(normalize_role_name("ROLE_").is_err());
    }

    #[test]
    fn user_without_roles_is_invalid() {
        let user = User::new("george", "secret", true);
        assert_eq!(user.validate(), Err(ValidationError::MissingRoles));
    }

    #[test]
    fn normalize_roles_is_all_or_nothing() {
        let mut user = User::new("george", "secret", true);
        user.add_role("OWNER_ADMIN");
        user.add_role("bad name");
        assert!(user.normalize_roles().is_err());
        assert_eq!(user.roles()[0].name, "OWNER_ADMIN");
    }
}
