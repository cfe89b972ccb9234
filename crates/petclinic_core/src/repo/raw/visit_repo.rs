//! Visit repository over hand-written statements.

use super::rows::{map_visit_row, VISIT_SELECT_SQL};
use super::BACKEND;
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId, ValidationError};
use crate::repo::{log_failure, RepoError, RepoResult, VisitRepository};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqlVisitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlVisitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, visit: &mut Visit) -> RepoResult<()> {
        visit.validate()?;
        let pet_id = visit
            .pet_id()
            .ok_or(ValidationError::MissingRelation("visit.pet"))?;

        match visit.id() {
            None => {
                self.conn.execute(
                    "INSERT INTO visits (pet_id, visit_date, description) VALUES (?1, ?2, ?3);",
                    params![pet_id, visit.date, visit.description],
                )?;
                let id = self.conn.last_insert_rowid();
                visit.assign_id(id);
                info!("event=visit_save module=repo backend={BACKEND} status=ok mode=insert visit_id={id} pet_id={pet_id}");
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE visits
                     SET
                        pet_id = ?1,
                        visit_date = ?2,
                        description = ?3
                     WHERE id = ?4;",
                    params![pet_id, visit.date, visit.description, id],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("visit", id));
                }
                info!("event=visit_save module=repo backend={BACKEND} status=ok mode=update visit_id={id}");
            }
        }
        Ok(())
    }

    fn query_visits(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(sql)?;
        let visits = stmt
            .query_map(params, map_visit_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(visits)
    }
}

impl VisitRepository for SqlVisitRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Visit> {
        self.conn
            .query_row(
                &format!("{VISIT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                map_visit_row,
            )
            .optional()?
            .ok_or_else(|| {
                debug!("event=visit_find module=repo backend={BACKEND} status=not_found visit_id={id}");
                RepoError::not_found("visit", id)
            })
    }

    fn find_all(&self) -> RepoResult<Vec<Visit>> {
        self.query_visits(
            &format!("{VISIT_SELECT_SQL} ORDER BY visit_date ASC, id ASC;"),
            [],
        )
    }

    fn find_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
        self.query_visits(
            &format!("{VISIT_SELECT_SQL} WHERE pet_id = ?1 ORDER BY visit_date ASC, id ASC;"),
            [pet_id],
        )
    }

    fn save(&self, visit: &mut Visit) -> RepoResult<()> {
        let id = visit.id();
        log_failure(BACKEND, "visit_save", id, self.write(visit))
    }

    fn delete(&self, visit: &Visit) -> RepoResult<()> {
        let Some(visit_id) = visit.id() else {
            return Ok(());
        };
        let result = self
            .conn
            .execute("DELETE FROM visits WHERE id = ?1;", [visit_id])
            .map_err(RepoError::from);
        log_failure(BACKEND, "visit_delete", Some(visit_id), result)?;
        info!("event=visit_delete module=repo backend={BACKEND} status=ok visit_id={visit_id}");
        Ok(())
    }
}
