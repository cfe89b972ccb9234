//! Clinic facade over the bound repositories.

use crate::config::Profile;
use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetType};
use crate::model::vet::{Specialty, Vet};
use crate::model::visit::Visit;
use crate::model::EntityId;
use crate::repo::selector::Repositories;
use crate::repo::RepoResult;

/// Storage-agnostic clinic operations for boundary layers.
pub struct ClinicService<'r, 'conn> {
    repos: &'r Repositories<'conn>,
}

impl<'r, 'conn> ClinicService<'r, 'conn> {
    pub fn new(repos: &'r Repositories<'conn>) -> Self {
        Self { repos }
    }

    pub fn profile(&self) -> Profile {
        self.repos.profile()
    }

    pub fn find_owner_by_id(&self, id: EntityId) -> RepoResult<Owner> {
        self.repos.owners().find_by_id(id)
    }

    pub fn find_all_owners(&self) -> RepoResult<Vec<Owner>> {
        self.repos.owners().find_all()
    }

    /// Owners whose last name starts with `prefix`, fully hydrated.
    pub fn find_owners_by_last_name(&self, prefix: &str) -> RepoResult<Vec<Owner>> {
        self.repos.owners().find_by_last_name(prefix)
    }

    pub fn save_owner(&self, owner: &mut Owner) -> RepoResult<()> {
        self.repos.owners().save(owner)
    }

    pub fn delete_owner(&self, owner: &Owner) -> RepoResult<()> {
        self.repos.owners().delete(owner)
    }

    pub fn find_pet_by_id(&self, id: EntityId) -> RepoResult<Pet> {
        self.repos.pets().find_by_id(id)
    }

    pub fn find_all_pets(&self) -> RepoResult<Vec<Pet>> {
        self.repos.pets().find_all()
    }

    pub fn find_pets_by_owner_id(&self, owner_id: EntityId) -> RepoResult<Vec<Pet>> {
        self.repos.pets().find_by_owner_id(owner_id)
    }

    pub fn save_pet(&self, pet: &mut Pet) -> RepoResult<()> {
        self.repos.pets().save(pet)
    }

    pub fn delete_pet(&self, pet: &Pet) -> RepoResult<()> {
        self.repos.pets().delete(pet)
    }

    pub fn find_visit_by_id(&self, id: EntityId) -> RepoResult<Visit> {
        self.repos.visits().find_by_id(id)
    }

    pub fn find_all_visits(&self) -> RepoResult<Vec<Visit>> {
        self.repos.visits().find_all()
    }

    pub fn find_visits_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
        self.repos.visits().find_by_pet_id(pet_id)
    }

    pub fn save_visit(&self, visit: &mut Visit) -> RepoResult<()> {
        self.repos.visits().save(visit)
    }

    pub fn delete_visit(&self, visit: &Visit) -> RepoResult<()> {
        self.repos.visits().delete(visit)
    }

    pub fn find_pet_type_by_id(&self, id: EntityId) -> RepoResult<PetType> {
        self.repos.pet_types().find_by_id(id)
    }

    pub fn find_all_pet_types(&self) -> RepoResult<Vec<PetType>> {
        self.repos.pet_types().find_all()
    }

    /// Pet types as offered when registering a pet, ordered by name.
    pub fn find_pet_types(&self) -> RepoResult<Vec<PetType>> {
        self.repos.pets().find_pet_types()
    }

    pub fn find_pet_types_by_name(&self, name: &str) -> RepoResult<Vec<PetType>> {
        self.repos.pet_types().find_by_name(name)
    }

    pub fn save_pet_type(&self, pet_type: &mut PetType) -> RepoResult<()> {
        self.repos.pet_types().save(pet_type)
    }

    pub fn delete_pet_type(&self, pet_type: &PetType) -> RepoResult<()> {
        self.repos.pet_types().delete(pet_type)
    }

    pub fn find_vet_by_id(&self, id: EntityId) -> RepoResult<Vet> {
        self.repos.vets().find_by_id(id)
    }

    pub fn find_all_vets(&self) -> RepoResult<Vec<Vet>> {
        self.repos.vets().find_all()
    }

    pub fn save_vet(&self, vet: &mut Vet) -> RepoResult<()> {
        self.repos.vets().save(vet)
    }

    pub fn delete_vet(&self, vet: &Vet) -> RepoResult<()> {
        self.repos.vets().delete(vet)
    }

    pub fn find_specialty_by_id(&self, id: EntityId) -> RepoResult<Specialty> {
        self.repos.specialties().find_by_id(id)
    }

    pub fn find_all_specialties(&self) -> RepoResult<Vec<Specialty>> {
        self.repos.specialties().find_all()
    }

    pub fn find_specialties_by_names(&self, names: &[String]) -> RepoResult<Vec<Specialty>> {
        self.repos.specialties().find_by_names(names)
    }

    pub fn save_specialty(&self, specialty: &mut Specialty) -> RepoResult<()> {
        self.repos.specialties().save(specialty)
    }

    pub fn delete_specialty(&self, specialty: &Specialty) -> RepoResult<()> {
        self.repos.specialties().delete(specialty)
    }
}
