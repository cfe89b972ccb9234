//! Managed-graph backend.
//!
//! # Responsibility
//! - Load entities through an [`EntityManager`] whose persistence context
//!   resolves relationships and keeps one instance per `(table, id)`.
//! - Decide insert vs update from the entity's identity (`persist`/`merge`).
//! - Sequence cross-aggregate cascades by hand with bulk statements.
//!
//! # Invariants
//! - The persistence context lives for one outermost unit of work and is
//!   cleared when it ends, successfully or not.
//! - Bulk statements bypass the context, so every delete that issues them
//!   flushes and clears the context as its last step.

mod entity_manager;
mod mapping;
mod owner_repo;
mod pet_repo;
mod pet_type_repo;
mod user_repo;
mod vet_repo;

pub use entity_manager::EntityManager;
pub use owner_repo::ManagedOwnerRepository;
pub use pet_repo::{ManagedPetRepository, ManagedVisitRepository};
pub use pet_type_repo::ManagedPetTypeRepository;
pub use user_repo::ManagedUserRepository;
pub use vet_repo::{ManagedSpecialtyRepository, ManagedVetRepository};

pub(crate) const BACKEND: &str = "managed";
