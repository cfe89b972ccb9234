//! Repository contracts and storage backends.
//!
//! # Responsibility
//! - Declare one contract per aggregate root (find-by-id, find-all,
//!   find-by-attribute, save, delete).
//! - Provide three independent backends behind those contracts:
//!   [`raw`] (hand-written statements), [`managed`] (persistence context)
//!   and [`convention`] (generated CRUD with delete overrides).
//! - Bind exactly one backend per process via [`selector`].
//!
//! # Invariants
//! - `find_by_id` signals `NotFound` instead of returning an empty value.
//! - Collection finders return fully hydrated trees, never bare rows.
//! - `save` assigns the identity of new entities in place.
//! - `delete` of an entity without identity is a no-op.
//! - Cascading deletes remove descendants first and are atomic.
//! - Backends never call each other.

use crate::db::DbError;
use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetType};
use crate::model::user::User;
use crate::model::vet::{Specialty, Vet};
use crate::model::visit::Visit;
use crate::model::{EntityId, ValidationError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod convention;
pub mod managed;
pub mod raw;
pub mod selector;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every backend.
#[derive(Debug)]
pub enum RepoError {
    /// Single-entity lookup matched zero rows.
    NotFound { entity: &'static str, id: String },
    /// Entity invariant violated; raised before any write.
    Validation(ValidationError),
    /// Connectivity, constraint violation or any other SQLite fault.
    Db(DbError),
    /// Stored row cannot be mapped back to a valid entity.
    InvalidData(String),
}

/// Coarse classification used by callers to pick their own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Owner aggregate contract. Reads return owners with pets and visits.
pub trait OwnerRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Owner>;
    fn find_all(&self) -> RepoResult<Vec<Owner>>;
    /// Prefix match on last name, ordered by owner id.
    fn find_by_last_name(&self, prefix: &str) -> RepoResult<Vec<Owner>>;
    /// Writes the owner row only; pets are saved through [`PetRepository`].
    fn save(&self, owner: &mut Owner) -> RepoResult<()>;
    /// Deletes visits, then pets, then the owner row.
    fn delete(&self, owner: &Owner) -> RepoResult<()>;
}

/// Pet contract. Reads return pets with their visits in date order.
pub trait PetRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Pet>;
    fn find_all(&self) -> RepoResult<Vec<Pet>>;
    fn find_by_owner_id(&self, owner_id: EntityId) -> RepoResult<Vec<Pet>>;
    /// All pet types ordered by name.
    fn find_pet_types(&self) -> RepoResult<Vec<PetType>>;
    fn save(&self, pet: &mut Pet) -> RepoResult<()>;
    fn delete(&self, pet: &Pet) -> RepoResult<()>;
}

pub trait VisitRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Visit>;
    fn find_all(&self) -> RepoResult<Vec<Visit>>;
    /// Visits of one pet ordered by date ascending.
    fn find_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>>;
    fn save(&self, visit: &mut Visit) -> RepoResult<()>;
    fn delete(&self, visit: &Visit) -> RepoResult<()>;
}

pub trait PetTypeRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<PetType>;
    fn find_all(&self) -> RepoResult<Vec<PetType>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<PetType>>;
    fn save(&self, pet_type: &mut PetType) -> RepoResult<()>;
    /// Deletes visits of pets of this type, those pets, then the type.
    fn delete(&self, pet_type: &PetType) -> RepoResult<()>;
}

/// Vet contract. Reads return vets with specialties sorted by name.
pub trait VetRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Vet>;
    fn find_all(&self) -> RepoResult<Vec<Vet>>;
    /// Writes the vet row and rewrites its junction rows.
    fn save(&self, vet: &mut Vet) -> RepoResult<()>;
    fn delete(&self, vet: &Vet) -> RepoResult<()>;
}

pub trait SpecialtyRepository {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Specialty>;
    fn find_all(&self) -> RepoResult<Vec<Specialty>>;
    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Specialty>>;
    fn save(&self, specialty: &mut Specialty) -> RepoResult<()>;
    /// Clears junction rows before deleting the specialty row.
    fn delete(&self, specialty: &Specialty) -> RepoResult<()>;
}

pub trait UserRepository {
    fn find_by_username(&self, username: &str) -> RepoResult<User>;
    /// Writes the user row and replaces its full role set.
    fn save(&self, user: &mut User) -> RepoResult<()>;
}

/// Emits `status=error` for a failed write and hands `result` back unchanged.
///
/// `id` is the entity id known before the write; new entities have none.
pub(crate) fn log_failure<T>(
    backend: &str,
    event: &str,
    id: Option<EntityId>,
    result: RepoResult<T>,
) -> RepoResult<T> {
    if let Err(err) = &result {
        match id {
            Some(id) => error!(
                "event={event} module=repo backend={backend} status=error id={id} error={err}"
            ),
            None => error!("event={event} module=repo backend={backend} status=error error={err}"),
        }
    }
    result
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` prefix pattern.
pub(crate) fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Comma-separated `?N` placeholders starting at `?1`.
pub(crate) fn placeholders(count: usize) -> String {
    placeholders_from(1, count)
}

/// Comma-separated `?N` placeholders starting at `?start`.
pub(crate) fn placeholders_from(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{like_prefix_pattern, placeholders, placeholders_from, ErrorKind, RepoError};

    #[test]
    fn like_prefix_pattern_escapes_wildcards() {
        assert_eq!(like_prefix_pattern("Davis"), "Davis%");
        assert_eq!(like_prefix_pattern("50%_off"), "50\\%\\_off%");
        assert_eq!(like_prefix_pattern(""), "%");
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholders(3), "?1, ?2, ?3");
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders_from(2, 2), "?2, ?3");
    }

    #[test]
    fn kind_classifies_invalid_data_as_storage() {
        let err = RepoError::InvalidData("bad date".to_string());
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(RepoError::not_found("owner", 3).is_not_found());
    }
}
