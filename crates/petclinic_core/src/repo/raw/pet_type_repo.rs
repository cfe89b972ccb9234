//! Pet type repository over hand-written statements.
//!
//! Deleting a type cascades across aggregates: visits of every pet of the
//! type, then those pets, then the type row.

use super::rows::{delete_pet_rows, load_pet_types, map_pet_type_row, query_ids};
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::pet::PetType;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, PetTypeRepository, RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Instant;

pub struct SqlPetTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlPetTypeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, pet_type: &mut PetType) -> RepoResult<()> {
        pet_type.validate()?;

        match pet_type.id() {
            None => {
                self.conn
                    .execute("INSERT INTO types (name) VALUES (?1);", [&pet_type.name])?;
                let id = self.conn.last_insert_rowid();
                pet_type.assign_id(id);
                info!("event=pet_type_save module=repo backend={BACKEND} status=ok mode=insert pet_type_id={id}");
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE types SET name = ?1 WHERE id = ?2;",
                    params![pet_type.name, id],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("pet type", id));
                }
                info!("event=pet_type_save module=repo backend={BACKEND} status=ok mode=update pet_type_id={id}");
            }
        }
        Ok(())
    }
}

impl PetTypeRepository for SqlPetTypeRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<PetType> {
        self.conn
            .query_row(
                "SELECT id, name FROM types WHERE id = ?1;",
                [id],
                map_pet_type_row,
            )
            .optional()?
            .ok_or_else(|| RepoError::not_found("pet type", id))
    }

    fn find_all(&self) -> RepoResult<Vec<PetType>> {
        load_pet_types(self.conn)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<PetType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM types WHERE name = ?1 ORDER BY id ASC;")?;
        let pet_types = stmt
            .query_map([name], map_pet_type_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pet_types)
    }

    fn save(&self, pet_type: &mut PetType) -> RepoResult<()> {
        let id = pet_type.id();
        log_failure(BACKEND, "pet_type_save", id, self.write(pet_type))
    }

    fn delete(&self, pet_type: &PetType) -> RepoResult<()> {
        let Some(type_id) = pet_type.id() else {
            return Ok(());
        };
        let started_at = Instant::now();

        let result = in_unit_of_work(self.conn, |conn| {
            let pet_ids = query_ids(
                conn,
                "SELECT id FROM pets WHERE type_id = ?1 ORDER BY id ASC;",
                [type_id],
            )?;
            for pet_id in &pet_ids {
                delete_pet_rows(conn, *pet_id)?;
            }
            conn.execute("DELETE FROM types WHERE id = ?1;", [type_id])?;
            Ok::<_, RepoError>(pet_ids.len())
        });

        match result {
            Ok(pets_removed) => {
                info!(
                    "event=pet_type_delete module=repo backend={BACKEND} status=ok pet_type_id={type_id} pets_removed={pets_removed} duration_ms={}",
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
