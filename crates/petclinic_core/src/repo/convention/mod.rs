//! Convention backend with delete overrides.
//!
//! # Responsibility
//! - Generate finders and saves from declarative [`rules::TableRules`].
//! - Keep a per-session read cache of flat rows keyed by `(table, id)`.
//! - Override every delete that has dependents with an explicit cascade.
//!
//! # Invariants
//! - Generated saves write through to the cache.
//! - An override delete collects dependent ids, deletes dependents
//!   bottom-up, deletes the root, and clears the whole cache last.

mod owner_repo;
mod pet_repo;
mod pet_type_repo;
pub(crate) mod rules;
mod session;
mod user_repo;
mod vet_repo;

pub use owner_repo::ConventionOwnerRepository;
pub use pet_repo::{ConventionPetRepository, ConventionVisitRepository};
pub use pet_type_repo::ConventionPetTypeRepository;
pub use session::{ConventionSession, ReadCache};
pub use user_repo::ConventionUserRepository;
pub use vet_repo::{ConventionSpecialtyRepository, ConventionVetRepository};

pub(crate) const BACKEND: &str = "convention";
