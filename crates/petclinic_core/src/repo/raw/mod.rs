//! Raw-statement backend.
//!
//! # Responsibility
//! - Implement every repository contract with explicit parameterized SQL.
//! - Own the manual aggregate assembly (`Owner -> Pets -> Visits`).
//! - Own the manual cascading deletes, children before parents.
//!
//! # Invariants
//! - Pets are assembled in ascending id order, visits in ascending date order
//!   (id breaks ties).
//! - Pet types are resolved from one pre-fetched set per assembly, never with
//!   one query per pet.
//! - Multi-statement writes run inside [`in_unit_of_work`](crate::db::in_unit_of_work).

mod owner_repo;
mod pet_repo;
mod pet_type_repo;
mod rows;
mod specialty_repo;
mod user_repo;
mod vet_repo;
mod visit_repo;

pub use owner_repo::SqlOwnerRepository;
pub use pet_repo::SqlPetRepository;
pub use pet_type_repo::SqlPetTypeRepository;
pub use specialty_repo::SqlSpecialtyRepository;
pub use user_repo::SqlUserRepository;
pub use vet_repo::SqlVetRepository;
pub use visit_repo::SqlVisitRepository;

pub(crate) const BACKEND: &str = "raw";
