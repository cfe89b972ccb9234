//! Vet and specialty repositories generated from table rules.
//!
//! Both deletes are overridden: junction rows reference either side and
//! belong to neither, so they are cleared before the root row.

use super::session::ConventionSession;
use super::BACKEND;
use crate::model::vet::{Specialty, Vet};
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, RepoError, RepoResult, SpecialtyRepository, VetRepository};
use log::info;
use std::rc::Rc;

pub struct ConventionVetRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionVetRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl VetRepository for ConventionVetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Vet> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Vet>> {
        self.session.find_all()
    }

    fn save(&self, vet: &mut Vet) -> RepoResult<()> {
        let id = vet.id();
        let result = vet
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(vet));
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
        let result = self.session.override_delete(|conn| {
            conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [vet_id])?;
            conn.execute("DELETE FROM vets WHERE id = ?1;", [vet_id])?;
            Ok(())
        });
        log_failure(BACKEND, "vet_delete", Some(vet_id), result)?;
        info!("event=vet_delete module=repo backend={BACKEND} status=ok vet_id={vet_id}");
        Ok(())
    }
}

pub struct ConventionSpecialtyRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionSpecialtyRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl SpecialtyRepository for ConventionSpecialtyRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Specialty> {
        self.session.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Specialty>> {
        self.session.find_all()
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Specialty>> {
        self.session.find_in("name", names)
    }

    fn save(&self, specialty: &mut Specialty) -> RepoResult<()> {
        let id = specialty.id();
        let result = specialty
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.session.save(specialty));
        let mode = log_failure(BACKEND, "specialty_save", id, result)?;
        info!(
            "event=specialty_save module=repo backend={BACKEND} status=ok mode={mode} specialty_id={}",
            specialty.id().unwrap_or_default()
        );
        Ok(())
    }

    fn delete(&self, specialty: &Specialty) -> RepoResult<()> {
        let Some(specialty_id) = specialty.id() else {
            return Ok(());
        };
        let result = self.session.override_delete(|conn| {
            let links = conn.execute(
                "DELETE FROM vet_specialties WHERE specialty_id = ?1;",
                [specialty_id],
            )?;
            conn.execute("DELETE FROM specialties WHERE id = ?1;", [specialty_id])?;
            Ok(links)
        });
        let links_removed = log_failure(BACKEND, "specialty_delete", Some(specialty_id), result)?;
        info!(
            "event=specialty_delete module=repo backend={BACKEND} status=ok specialty_id={specialty_id} links_removed={links_removed}"
        );
        Ok(())
    }
}
