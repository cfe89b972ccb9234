//! Pet type repository generated from table rules, with an override delete.

use super::session::{bulk_delete_in, collect_ids, ConventionSession};
use super::BACKEND;
use crate::model::pet::PetType;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, PetTypeRepository, RepoError, RepoResult};
use log::{error, info};
use std::rc::Rc;
use std::time::Instant;

pub struct ConventionPetTypeRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionPetTypeRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl PetTypeRepository for ConventionPetTypeRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<PetType> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<PetType>> {
        self.session.find_all()
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<PetType>> {
        self.session.find_by("name", name)
    }

    fn save(&self, pet_type: &mut PetType) -> RepoResult<()> {
        let id = pet_type.id();
        let result = pet_type
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(pet_type));
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

        let result = self.session.override_delete(|conn| {
            let pet_ids = collect_ids(
                conn,
                "SELECT id FROM pets WHERE type_id = ?1 ORDER BY id ASC;",
                [type_id],
            )?;
            let visits_removed = bulk_delete_in(conn, "visits", "pet_id", &pet_ids)?;
            let pets_removed = bulk_delete_in(conn, "pets", "id", &pet_ids)?;
            conn.execute("DELETE FROM types WHERE id = ?1;", [type_id])?;
            Ok((pets_removed, visits_removed))
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
