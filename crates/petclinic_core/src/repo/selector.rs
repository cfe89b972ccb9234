//! Strategy selector: binds one backend per process from a [`Profile`].
//!
//! # Invariants
//! - Every contract in one [`Repositories`] comes from the same backend.
//! - The binding is fixed once built; there is no way to switch it.

use super::convention::{
    ConventionOwnerRepository, ConventionPetRepository, ConventionPetTypeRepository,
    ConventionSession, ConventionSpecialtyRepository, ConventionUserRepository,
    ConventionVetRepository, ConventionVisitRepository,
};
use super::managed::{
    EntityManager, ManagedOwnerRepository, ManagedPetRepository, ManagedPetTypeRepository,
    ManagedSpecialtyRepository, ManagedUserRepository, ManagedVetRepository,
    ManagedVisitRepository,
};
use super::raw::{
    SqlOwnerRepository, SqlPetRepository, SqlPetTypeRepository, SqlSpecialtyRepository,
    SqlUserRepository, SqlVetRepository, SqlVisitRepository,
};
use super::{
    OwnerRepository, PetRepository, PetTypeRepository, SpecialtyRepository, UserRepository,
    VetRepository, VisitRepository,
};
use crate::config::Profile;
use log::info;
use rusqlite::Connection;
use std::rc::Rc;

/// The repository set bound for one connection.
pub struct Repositories<'conn> {
    profile: Profile,
    owners: Box<dyn OwnerRepository + 'conn>,
    pets: Box<dyn PetRepository + 'conn>,
    visits: Box<dyn VisitRepository + 'conn>,
    pet_types: Box<dyn PetTypeRepository + 'conn>,
    vets: Box<dyn VetRepository + 'conn>,
    specialties: Box<dyn SpecialtyRepository + 'conn>,
    users: Box<dyn UserRepository + 'conn>,
    convention: Option<Rc<ConventionSession<'conn>>>,
}

impl<'conn> Repositories<'conn> {
    pub fn bind(profile: Profile, conn: &'conn Connection) -> Self {
        let repositories = match profile {
            Profile::Raw => Self {
                profile,
                owners: Box::new(SqlOwnerRepository::new(conn)),
                pets: Box::new(SqlPetRepository::new(conn)),
                visits: Box::new(SqlVisitRepository::new(conn)),
                pet_types: Box::new(SqlPetTypeRepository::new(conn)),
                vets: Box::new(SqlVetRepository::new(conn)),
                specialties: Box::new(SqlSpecialtyRepository::new(conn)),
                users: Box::new(SqlUserRepository::new(conn)),
                convention: None,
            },
            Profile::Managed => {
                let em = Rc::new(EntityManager::new(conn));
                Self {
                    profile,
                    owners: Box::new(ManagedOwnerRepository::new(Rc::clone(&em))),
                    pets: Box::new(ManagedPetRepository::new(Rc::clone(&em))),
                    visits: Box::new(ManagedVisitRepository::new(Rc::clone(&em))),
                    pet_types: Box::new(ManagedPetTypeRepository::new(Rc::clone(&em))),
                    vets: Box::new(ManagedVetRepository::new(Rc::clone(&em))),
                    specialties: Box::new(ManagedSpecialtyRepository::new(Rc::clone(&em))),
                    users: Box::new(ManagedUserRepository::new(em)),
                    convention: None,
                }
            }
            Profile::Convention => {
                let session = Rc::new(ConventionSession::new(conn));
                Self {
                    profile,
                    owners: Box::new(ConventionOwnerRepository::new(Rc::clone(&session))),
                    pets: Box::new(ConventionPetRepository::new(Rc::clone(&session))),
                    visits: Box::new(ConventionVisitRepository::new(Rc::clone(&session))),
                    pet_types: Box::new(ConventionPetTypeRepository::new(Rc::clone(&session))),
                    vets: Box::new(ConventionVetRepository::new(Rc::clone(&session))),
                    specialties: Box::new(ConventionSpecialtyRepository::new(Rc::clone(
                        &session,
                    ))),
                    users: Box::new(ConventionUserRepository::new(Rc::clone(&session))),
                    convention: Some(session),
                }
            }
        };
        info!(
            "event=repositories_bind module=repo status=ok profile={}",
            profile
        );
        repositories
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn owners(&self) -> &dyn OwnerRepository {
        self.owners.as_ref()
    }

    pub fn pets(&self) -> &dyn PetRepository {
        self.pets.as_ref()
    }

    pub fn visits(&self) -> &dyn VisitRepository {
        self.visits.as_ref()
    }

    pub fn pet_types(&self) -> &dyn PetTypeRepository {
        self.pet_types.as_ref()
    }

    pub fn vets(&self) -> &dyn VetRepository {
        self.vets.as_ref()
    }

    pub fn specialties(&self) -> &dyn SpecialtyRepository {
        self.specialties.as_ref()
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Rows held by the convention read cache; `None` for other profiles.
    pub fn cached_rows(&self) -> Option<usize> {
        self.convention.as_ref().map(|session| session.cached_rows())
    }
}
