//! Owner repository generated from table rules, with an override delete.

use super::session::{bulk_delete_in, collect_ids, ConventionSession};
use super::BACKEND;
use crate::model::owner::Owner;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, OwnerRepository, RepoError, RepoResult};
use log::{error, info};
use std::rc::Rc;
use std::time::Instant;

pub struct ConventionOwnerRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionOwnerRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl OwnerRepository for ConventionOwnerRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Owner> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Owner>> {
        self.session.find_all()
    }

    fn find_by_last_name(&self, prefix: &str) -> RepoResult<Vec<Owner>> {
        self.session.find_by_prefix("last_name", prefix)
    }

    fn save(&self, owner: &mut Owner) -> RepoResult<()> {
        let id = owner.id();
        let result = owner
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(owner));
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

        let result = self.session.override_delete(|conn| {
            let pet_ids = collect_ids(
                conn,
                "SELECT id FROM pets WHERE owner_id = ?1 ORDER BY id ASC;",
                [owner_id],
            )?;
            let visits_removed = bulk_delete_in(conn, "visits", "pet_id", &pet_ids)?;
            let pets_removed = bulk_delete_in(conn, "pets", "id", &pet_ids)?;
            conn.execute("DELETE FROM owners WHERE id = ?1;", [owner_id])?;
            Ok((pets_removed, visits_removed))
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
