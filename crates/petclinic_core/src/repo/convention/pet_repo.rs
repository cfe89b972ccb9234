//! Pet and visit repositories generated from table rules.

use super::session::ConventionSession;
use super::BACKEND;
use crate::model::pet::{Pet, PetType};
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, PetRepository, RepoError, RepoResult, VisitRepository};
use log::info;
use std::rc::Rc;

pub struct ConventionPetRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionPetRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl PetRepository for ConventionPetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Pet> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Pet>> {
        self.session.find_all()
    }

    fn find_by_owner_id(&self, owner_id: EntityId) -> RepoResult<Vec<Pet>> {
        self.session.find_by("owner_id", owner_id)
    }

    fn find_pet_types(&self) -> RepoResult<Vec<PetType>> {
        self.session.find_all()
    }

    fn save(&self, pet: &mut Pet) -> RepoResult<()> {
        let id = pet.id();
        let result = pet
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(pet));
        let mode = log_failure(BACKEND, "pet_save", id, result)?;
        info!(
            "event=pet_save module=repo backend={BACKEND} status=ok mode={mode} pet_id={} owner_id={}",
            pet.id().unwrap_or_default(),
            pet.owner_id().unwrap_or_default()
        );
        Ok(())
    }

    fn delete(&self, pet: &Pet) -> RepoResult<()> {
        let Some(pet_id) = pet.id() else {
            return Ok(());
        };
        let result = self.session.override_delete(|conn| {
            let visits = conn.execute("DELETE FROM visits WHERE pet_id = ?1;", [pet_id])?;
            conn.execute("DELETE FROM pets WHERE id = ?1;", [pet_id])?;
            Ok(visits)
        });
        let visits_removed = log_failure(BACKEND, "pet_delete", Some(pet_id), result)?;
        info!(
            "event=pet_delete module=repo backend={BACKEND} status=ok pet_id={pet_id} visits_removed={visits_removed}"
        );
        Ok(())
    }
}

pub struct ConventionVisitRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionVisitRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl VisitRepository for ConventionVisitRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Visit> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Visit>> {
        self.session.find_all()
    }

    fn find_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
        self.session.find_by("pet_id", pet_id)
    }

    fn save(&self, visit: &mut Visit) -> RepoResult<()> {
        let id = visit.id();
        let result = visit
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(visit));
        let mode = log_failure(BACKEND, "visit_save", id, result)?;
        info!(
            "event=visit_save module=repo backend={BACKEND} status=ok mode={mode} visit_id={}",
            visit.id().unwrap_or_default()
        );
        Ok(())
    }

    /// Visits have no dependents, so the generated delete is kept.
    fn delete(&self, visit: &Visit) -> RepoResult<()> {
        log_failure(BACKEND, "visit_delete", visit.id(), self.session.delete_row(visit))?;
        if let Some(visit_id) = visit.id() {
            info!("event=visit_delete module=repo backend={BACKEND} status=ok visit_id={visit_id}");
        }
        Ok(())
    }
}
