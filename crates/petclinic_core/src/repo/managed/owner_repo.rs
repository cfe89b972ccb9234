//! Owner repository over the entity manager.
//!
//! Deleting an owner walks the loaded graph: every visit and pet reachable
//! from the owner is scheduled for removal before the owner itself.

use super::{EntityManager, BACKEND};
use crate::model::owner::Owner;
use crate::model::{Entity, EntityId};
use crate::repo::{like_prefix_pattern, log_failure, OwnerRepository, RepoError, RepoResult};
use log::{debug, error, info};
use std::rc::Rc;
use std::time::Instant;

pub struct ManagedOwnerRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedOwnerRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl OwnerRepository for ManagedOwnerRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Owner> {
        self.em.read_only(|em| em.get::<Owner>(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Owner>> {
        self.em
            .read_only(|em| em.query::<Owner, _>("ORDER BY id ASC", []))
    }

    fn find_by_last_name(&self, prefix: &str) -> RepoResult<Vec<Owner>> {
        let owners = self.em.read_only(|em| {
            em.query::<Owner, _>(
                "WHERE last_name LIKE ?1 ESCAPE '\\' ORDER BY id ASC",
                [like_prefix_pattern(prefix)],
            )
        })?;
        debug!(
            "event=owner_find_by_last_name module=repo backend={BACKEND} status=ok matches={}",
            owners.len()
        );
        Ok(owners)
    }

    fn save(&self, owner: &mut Owner) -> RepoResult<()> {
        let id = owner.id();
        let result = owner
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.em.transactional(|em| em.save(owner)));
        let mode = log_failure(BACKEND, "owner_save", id, result)?;
        info!(
            "event=owner_save module=repo backend={BACKEND} status=ok mode={mode} owner_id={}",
            owner.id().unwrap_or_default()
        );
        Ok(())
    }

    fn delete(&self, owner: &Owner) -> RepoResult<()> {
        let Some(owner_id) = owner.id() else {
            return Ok(());
        };
        let started_at = Instant::now();

        let result = self.em.transactional(|em| {
            let Some(managed) = em.find::<Owner>(owner_id)? else {
                return Ok((0, 0));
            };
            let mut visits_removed = 0;
            for pet in managed.pets() {
                for visit in pet.visits() {
                    em.remove(visit);
                }
                visits_removed += pet.visits().len();
                em.remove(pet);
            }
            em.remove(&managed);
            Ok((managed.pets().len(), visits_removed))
        });

        match result {
            Ok((pets_removed, visits_removed)) => {
                info!(
                    "event=owner_delete module=repo backend={BACKEND} status=ok owner_id={owner_id} pets_removed={pets_removed} visits_removed={visits_removed} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=owner_delete module=repo backend={BACKEND} status=error owner_id={owner_id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
