//! Clinic entity model.
//!
//! # Responsibility
//! - Define the plain records shared by every storage backend.
//! - Make the "new" vs "persisted" lifecycle explicit via [`Identity`].
//! - Model parent/child back-references as non-owning identifier links.
//!
//! # Invariants
//! - An entity whose identity is [`Identity::New`] has never been persisted.
//! - Once an identity is [`Identity::Persisted`] it never changes.
//! - Parents own their children (`Owner -> Pet -> Visit`); children only keep
//!   the parent id, set once when they are attached.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod owner;
pub mod pet;
pub mod user;
pub mod vet;
pub mod visit;

/// Storage identifier for integer-keyed entities.
pub type EntityId = i64;

/// Two-state lifecycle tag for integer-keyed entities.
///
/// Serialized as a nullable id so hydrated trees keep the usual wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<EntityId>", into = "Option<EntityId>")]
pub enum Identity {
    /// Constructed by a caller, never written to storage.
    #[default]
    New,
    /// Assigned (or confirmed) by a backend save or loaded from storage.
    Persisted(EntityId),
}

impl Identity {
    pub fn id(self) -> Option<EntityId> {
        match self {
            Self::New => None,
            Self::Persisted(id) => Some(id),
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Self::New)
    }

    /// Moves `New` to `Persisted(id)`. A persisted identity is left untouched.
    pub(crate) fn assign(&mut self, id: EntityId) {
        if let Self::New = self {
            *self = Self::Persisted(id);
        }
    }
}

impl From<Option<EntityId>> for Identity {
    fn from(value: Option<EntityId>) -> Self {
        value.map_or(Self::New, Self::Persisted)
    }
}

impl From<Identity> for Option<EntityId> {
    fn from(value: Identity) -> Self {
        value.id()
    }
}

/// Common surface of integer-keyed clinic entities.
pub trait Entity {
    fn identity(&self) -> Identity;

    fn id(&self) -> Option<EntityId> {
        self.identity().id()
    }

    fn is_new(&self) -> bool {
        self.identity().is_new()
    }
}

/// Finds an entity with the given id in an in-memory collection.
///
/// Entities that were never persisted never match.
pub fn find_by_id<'a, E, I>(items: I, id: EntityId) -> Option<&'a E>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    items.into_iter().find(|item| item.id() == Some(id))
}

/// Entity invariant violations detected before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A user must carry at least one role.
    MissingRoles,
    /// Role name cannot be normalized to the `ROLE_` form.
    InvalidRoleName(String),
    /// Required relationship is not set, e.g. `pet.owner`.
    MissingRelation(&'static str),
    /// Required text field is blank after trim.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoles => write!(f, "user must have at least one role"),
            Self::InvalidRoleName(name) => write!(f, "invalid role name `{name}`"),
            Self::MissingRelation(relation) => {
                write!(f, "required relationship `{relation}` is not set")
            }
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
        }
    }
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::{find_by_id, Entity, Identity};

    struct Item(Identity);

    impl Entity for Item {
        fn identity(&self) -> Identity {
            self.0
        }
    }

    #[test]
    fn assign_is_set_once() {
        let mut identity = Identity::New;
        identity.assign(7);
        identity.assign(9);
        assert_eq!(identity, Identity::Persisted(7));
    }

    #[test]
    fn find_by_id_skips_new_entities() {
        let items = vec![Item(Identity::New), Item(Identity::Persisted(3))];
        assert!(find_by_id(&items, 3).is_some());
        assert!(find_by_id(&items, 4).is_none());
    }
}
