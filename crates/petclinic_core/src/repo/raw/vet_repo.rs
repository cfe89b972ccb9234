//! Vet repository over hand-written statements.

use super::rows::map_specialty_row;
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::vet::Vet;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, RepoError, RepoResult, VetRepository};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const VET_SELECT_SQL: &str = "SELECT id, first_name, last_name FROM vets";

pub struct SqlVetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlVetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, vet: &mut Vet) -> RepoResult<()> {
        vet.validate()?;
        let specialty_ids = vet.specialty_ids()?;

        let (vet_id, mode) = in_unit_of_work(self.conn, |conn| {
            let (vet_id, mode) = match vet.id() {
                None => {
                    conn.execute(
                        "INSERT INTO vets (first_name, last_name) VALUES (?1, ?2);",
                        params![vet.first_name, vet.last_name],
                    )?;
                    (conn.last_insert_rowid(), "insert")
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE vets SET first_name = ?1, last_name = ?2 WHERE id = ?3;",
                        params![vet.first_name, vet.last_name, id],
                    )?;
                    if changed == 0 {
                        return Err(RepoError::not_found("vet", id));
                    }
                    (id, "update")
                }
            };

            conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [vet_id])?;
            for specialty_id in &specialty_ids {
                conn.execute(
                    "INSERT INTO vet_specialties (vet_id, specialty_id) VALUES (?1, ?2);",
                    params![vet_id, specialty_id],
                )?;
            }
            Ok((vet_id, mode))
        })?;

        vet.assign_id(vet_id);
        info!(
            "event=vet_save module=repo backend={BACKEND} status=ok mode={mode} vet_id={vet_id} specialties={}",
            specialty_ids.len()
        );
        Ok(())
    }

    fn load_specialties(&self, vet: &mut Vet) -> RepoResult<()> {
        let Some(vet_id) = vet.id() else {
            return Ok(());
        };
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name
             FROM vet_specialties vs
             INNER JOIN specialties s ON s.id = vs.specialty_id
             WHERE vs.vet_id = ?1
             ORDER BY s.name ASC, s.id ASC;",
        )?;
        let specialties = stmt
            .query_map([vet_id], map_specialty_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for specialty in specialties {
            vet.add_specialty(specialty);
        }
        Ok(())
    }
}

impl VetRepository for SqlVetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Vet> {
        let vet = self
            .conn
            .query_row(&format!("{VET_SELECT_SQL} WHERE id = ?1;"), [id], map_vet_row)
            .optional()?;
        let Some(mut vet) = vet else {
            return Err(RepoError::not_found("vet", id));
        };
        self.load_specialties(&mut vet)?;
        Ok(vet)
    }

    fn find_all(&self) -> RepoResult<Vec<Vet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VET_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut vets = stmt
            .query_map([], map_vet_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for vet in &mut vets {
            self.load_specialties(vet)?;
        }
        Ok(vets)
    }

    fn save(&self, vet: &mut Vet) -> RepoResult<()> {
        let id = vet.id();
        log_failure(BACKEND, "vet_save", id, self.write(vet))
    }

    fn delete(&self, vet: &Vet) -> RepoResult<()> {
        let Some(vet_id) = vet.id() else {
            return Ok(());
        };
        let result = in_unit_of_work(self.conn, |conn| {
            conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [vet_id])?;
            conn.execute("DELETE FROM vets WHERE id = ?1;", [vet_id])?;
            Ok::<_, RepoError>(())
        });
        log_failure(BACKEND, "vet_delete", Some(vet_id), result)?;
        info!("event=vet_delete module=repo backend={BACKEND} status=ok vet_id={vet_id}");
        Ok(())
    }
}

fn map_vet_row(row: &Row<'_>) -> rusqlite::Result<Vet> {
    Ok(Vet::new(
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
    )
    .with_id(row.get("id")?))
}
