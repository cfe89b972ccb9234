//! Pet and visit repositories over the entity manager.

use super::{EntityManager, BACKEND};
use crate::model::pet::{Pet, PetType};
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, PetRepository, RepoError, RepoResult, VisitRepository};
use log::info;
use std::rc::Rc;

pub struct ManagedPetRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedPetRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl PetRepository for ManagedPetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Pet> {
        self.em.read_only(|em| em.get::<Pet>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Pet>> {
        self.em.read_only(|em| em.query::<Pet, _>("ORDER BY id ASC", []))
    }

    fn find_by_owner_id(&self, owner_id: EntityId) -> RepoResult<Vec<Pet>> {
        self.em.read_only(|em| {
            em.query::<Pet, _>("WHERE owner_id = ?1 ORDER BY id ASC", [owner_id])
        })
    }

    fn find_pet_types(&self) -> RepoResult<Vec<PetType>> {
        self.em
            .read_only(|em| em.query::<PetType, _>("ORDER BY name ASC, id ASC", []))
    }

    fn save(&self, pet: &mut Pet) -> RepoResult<()> {
        let id = pet.id();
        let result = pet
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(pet)));
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
        let result = self.em.transactional(|em| {
            let Some(managed) = em.find::<Pet>(pet_id)? else {
                return Ok(0);
            };
            for visit in managed.visits() {
                em.remove(visit);
            }
            em.remove(&managed);
            Ok(managed.visits().len())
        });
        let visits_removed = log_failure(BACKEND, "pet_delete", Some(pet_id), result)?;
        info!(
            "event=pet_delete module=repo backend={BACKEND} status=ok pet_id={pet_id} visits_removed={visits_removed}"
        );
        Ok(())
    }
}

pub struct ManagedVisitRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedVisitRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl VisitRepository for ManagedVisitRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Visit> {
        self.em.read_only(|em| em.get::<Visit>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Visit>> {
        self.em
            .read_only(|em| em.query::<Visit, _>("ORDER BY visit_date ASC, id ASC", []))
    }

    fn find_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
        self.em.read_only(|em| {
            em.query::<Visit, _>(
                "WHERE pet_id = ?1 ORDER BY visit_date ASC, id ASC",
                [pet_id],
            )
        })
    }

    fn save(&self, visit: &mut Visit) -> RepoResult<()> {
        let id = visit.id();
        let result = visit
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(visit)));
        let mode = log_failure(BACKEND, "visit_save", id, result)?;
        info!(
            "event=visit_save module=repo backend={BACKEND} status=ok mode={mode} visit_id={}",
            visit.id().unwrap_or_default()
        );
        Ok(())
    }

    fn delete(&self, visit: &Visit) -> RepoResult<()> {
        let Some(visit_id) = visit.id() else {
            return Ok(());
        };
        let result = self.em.transactional(|em| {
            if let Some(managed) = em.find::<Visit>(visit_id)? {
                em.remove(&managed);
            }
            Ok(())
        });
        log_failure(BACKEND, "visit_delete", Some(visit_id), result)?;
        info!("event=visit_delete module=repo backend={BACKEND} status=ok visit_id={visit_id}");
        Ok(())
    }
}
