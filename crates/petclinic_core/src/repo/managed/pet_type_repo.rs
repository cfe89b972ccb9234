//! Pet type repository over the entity manager.
//!
//! Pets reference their type without owning it, so removing a type cannot
//! cascade through the graph. Delete issues bulk statements for the
//! dependent visits and pets, removes the type through the context, then
//! flushes and clears so no stale pet survives in the context.

use super::{EntityManager, BACKEND};
use crate::model::pet::PetType;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, PetTypeRepository, RepoError, RepoResult};
use log::{error, info};
use std::rc::Rc;
use std::time::Instant;

pub struct ManagedPetTypeRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedPetTypeRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl PetTypeRepository for ManagedPetTypeRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<PetType> {
        self.em.read_only(|em| em.get::<PetType>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<PetType>> {
        self.em
            .read_only(|em| em.query::<PetType, _>("ORDER BY name ASC, id ASC", []))
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<PetType>> {
        self.em
            .read_only(|em| em.query::<PetType, _>("WHERE name = ?1 ORDER BY id ASC", [name]))
    }

    fn save(&self, pet_type: &mut PetType) -> RepoResult<()> {
        let id = pet_type.id();
        let result = pet_type
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(pet_type)));
        let mode = log_failure(BACKEND, "pet_type_save", id, result)?;
        info!(
            "event=pet_type_save module=repo backend={BACKEND} status=ok mode={mode} pet_type_id={}",
            pet_type.id().unwrap_or_default()
        );
        Ok(())
    }

    fn delete(&self, pet_type: &PetType) -> RepoResult<()> {
        let Some(type_id) = pet_type.id() else {
            return Ok(());
        };
        let started_at = Instant::now();

        let result = self.em.transactional(|em| {
            let visits = em.execute_bulk(
                "DELETE FROM visits WHERE pet_id IN (SELECT id FROM pets WHERE type_id = ?1);",
                [type_id],
            )?;
            let pets = em.execute_bulk("DELETE FROM pets WHERE type_id = ?1;", [type_id])?;

            let managed = if em.contains(pet_type) {
                Some(pet_type.clone())
            } else {
                em.find::<PetType>(type_id)?
            };
            if let Some(managed) = managed {
                em.remove(&managed);
            }
            em.flush()?;
            em.clear();
            Ok((pets, visits))
        });

        match result {
            Ok((pets_removed, visits_removed)) => {
                info!(
                    "event=pet_type_delete module=repo backend={BACKEND} status=ok pet_type_id={type_id} pets_removed={pets_removed} visits_removed={visits_removed} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=pet_type_delete module=repo backend={BACKEND} status=error pet_type_id={type_id} error={err}"
                );
                Err(err)
            }
        }
    }
}
