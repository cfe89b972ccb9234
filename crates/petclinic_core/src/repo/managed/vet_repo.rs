//! Vet and specialty repositories over the entity manager.

use super::{EntityManager, BACKEND};
use crate::model::vet::{Specialty, Vet};
use crate::model::{Entity, EntityId};
use crate::repo::{
    log_failure, placeholders, RepoError, RepoResult, SpecialtyRepository, VetRepository,
};
use log::info;
use rusqlite::params_from_iter;
use std::rc::Rc;

pub struct ManagedVetRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedVetRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl VetRepository for ManagedVetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Vet> {
        self.em.read_only(|em| em.get::<Vet>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Vet>> {
        self.em.read_only(|em| em.query::<Vet, _>("ORDER BY id ASC", []))
    }

    fn save(&self, vet: &mut Vet) -> RepoResult<()> {
        let id = vet.id();
        let result = vet
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(vet)));
        let mode = log_failure(BACKEND, "vet_save", id, result)?;
        info!(
            "event=vet_save module=repo backend={BACKEND} status=ok mode={mode} vet_id={} specialties={}",
            vet.id().unwrap_or_default(),
            vet.specialties().len()
        );
        Ok(())
    }

    fn delete(&self, vet: &Vet) -> RepoResult<()> {
        let Some(vet_id) = vet.id() else {
            return Ok(());
        };
        let result = self.em.transactional(|em| {
            if let Some(managed) = em.find::<Vet>(vet_id)? {
                em.remove(&managed);
            }
            Ok(())
        });
        log_failure(BACKEND, "vet_delete", Some(vet_id), result)?;
        info!("event=vet_delete module=repo backend={BACKEND} status=ok vet_id={vet_id}");
        Ok(())
    }
}

pub struct ManagedSpecialtyRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedSpecialtyRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl SpecialtyRepository for ManagedSpecialtyRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Specialty> {
        self.em.read_only(|em| em.get::<Specialty>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Specialty>> {
        self.em
            .read_only(|em| em.query::<Specialty, _>("ORDER BY name ASC, id ASC", []))
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Specialty>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.em.read_only(|em| {
            em.query::<Specialty, _>(
                &format!(
                    "WHERE name IN ({}) ORDER BY name ASC, id ASC",
                    placeholders(names.len())
                ),
                params_from_iter(names),
            )
        })
    }

    fn save(&self, specialty: &mut Specialty) -> RepoResult<()> {
        let id = specialty.id();
        let result = specialty
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(specialty)));
        let mode = log_failure(BACKEND, "specialty_save", id, result)?;
        info!(
            "event=specialty_save module=repo backend={BACKEND} status=ok mode={mode} specialty_id={}",
            specialty.id().unwrap_or_default()
        );
        Ok(())
    }

    /// Junction rows are not part of any loaded graph, so they go first as
    /// a bulk statement and the context is cleared afterwards.
    fn delete(&self, specialty: &Specialty) -> RepoResult<()> {
        let Some(specialty_id) = specialty.id() else {
            return Ok(());
        };
        let result = self.em.transactional(|em| {
            let links = em.execute_bulk(
                "DELETE FROM vet_specialties WHERE specialty_id = ?1;",
                [specialty_id],
            )?;
            if let Some(managed) = em.find::<Specialty>(specialty_id)? {
                em.remove(&managed);
            }
            em.flush()?;
            em.clear();
            Ok(links)
        });
        let links_removed = log_failure(BACKEND, "specialty_delete", Some(specialty_id), result)?;
        info!(
            "event=specialty_delete module=repo backend={BACKEND} status=ok specialty_id={specialty_id} links_removed={links_removed}"
        );
        Ok(())
    }
}
