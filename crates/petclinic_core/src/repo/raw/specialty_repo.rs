//! Specialty repository over hand-written statements.

use super::rows::map_specialty_row;
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::vet::Specialty;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, placeholders, RepoError, RepoResult, SpecialtyRepository};
use log::info;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

pub struct SqlSpecialtyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlSpecialtyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, specialty: &mut Specialty) -> RepoResult<()> {
        specialty.validate()?;

        match specialty.id() {
            None => {
                self.conn.execute(
                    "INSERT INTO specialties (name) VALUES (?1);",
                    [&specialty.name],
                )?;
                let id = self.conn.last_insert_rowid();
                specialty.assign_id(id);
                info!("event=specialty_save module=repo backend={BACKEND} status=ok mode=insert specialty_id={id}");
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE specialties SET name = ?1 WHERE id = ?2;",
                    params![specialty.name, id],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("specialty", id));
                }
                info!("event=specialty_save module=repo backend={BACKEND} status=ok mode=update specialty_id={id}");
            }
        }
        Ok(())
    }
}

impl SpecialtyRepository for SqlSpecialtyRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Specialty> {
        self.conn
            .query_row(
                "SELECT id, name FROM specialties WHERE id = ?1;",
                [id],
                map_specialty_row,
            )
            .optional()?
            .ok_or_else(|| RepoError::not_found("specialty", id))
    }

    fn find_all(&self) -> RepoResult<Vec<Specialty>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM specialties ORDER BY name ASC, id ASC;")?;
        let specialties = stmt
            .query_map([], map_specialty_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(specialties)
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Specialty>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM specialties WHERE name IN ({}) ORDER BY name ASC, id ASC;",
            placeholders(names.len())
        ))?;
        let specialties = stmt
            .query_map(params_from_iter(names), map_specialty_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(specialties)
    }

    fn save(&self, specialty: &mut Specialty) -> RepoResult<()> {
        let id = specialty.id();
        log_failure(BACKEND, "specialty_save", id, self.write(specialty))
    }

    fn delete(&self, specialty: &Specialty) -> RepoResult<()> {
        let Some(specialty_id) = specialty.id() else {
            return Ok(());
        };

        let result = in_unit_of_work(self.conn, |conn| {
            let links = conn.execute(
                "DELETE FROM vet_specialties WHERE specialty_id = ?1;",
                [specialty_id],
            )?;
            conn.execute("DELETE FROM specialties WHERE id = ?1;", [specialty_id])?;
            Ok::<_, RepoError>(links)
        });
        let links_removed = log_failure(BACKEND, "specialty_delete", Some(specialty_id), result)?;
        info!(
            "event=specialty_delete module=repo backend={BACKEND} status=ok specialty_id={specialty_id} links_removed={links_removed}"
        );
        Ok(())
    }
}
