//! Persistence core for a veterinary clinic.
//!
//! Owners, pets, visits, vets, specialties, pet types and users behind one
//! repository contract per aggregate, with three interchangeable storage
//! backends bound once per process from a configured [`Profile`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ClinicConfig, ConfigError, Profile};
pub use db::{in_unit_of_work, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::owner::Owner;
pub use model::pet::{Pet, PetType};
pub use model::user::{normalize_role_name, Role, User};
pub use model::vet::{Specialty, Vet};
pub use model::visit::Visit;
pub use model::{find_by_id, Entity, EntityId, Identity, ValidationError};
pub use repo::selector::Repositories;
pub use repo::{ErrorKind, RepoError, RepoResult};
pub use service::clinic_service::ClinicService;
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
