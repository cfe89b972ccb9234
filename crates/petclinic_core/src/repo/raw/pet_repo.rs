//! Pet repository over hand-written statements.

use super::rows::{delete_pet_rows, load_pet_types, query_pets, PET_SELECT_SQL};
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::pet::{Pet, PetType};
use crate::model::{Entity, EntityId, ValidationError};
use crate::repo::{log_failure, PetRepository, RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{params, Connection};
use std::time::Instant;

pub struct SqlPetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlPetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, pet: &mut Pet) -> RepoResult<()> {
        pet.validate()?;
        let owner_id = pet
            .owner_id()
            .ok_or(ValidationError::MissingRelation("pet.owner"))?;
        let type_id = pet
            .pet_type
            .id()
            .ok_or(ValidationError::MissingRelation("pet.type"))?;

        match pet.id() {
            None => {
                self.conn.execute(
                    "INSERT INTO pets (name, birth_date, type_id, owner_id)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![pet.name, pet.birth_date, type_id, owner_id],
                )?;
                let id = self.conn.last_insert_rowid();
                pet.assign_id(id);
                info!("event=pet_save module=repo backend={BACKEND} status=ok mode=insert pet_id={id} owner_id={owner_id}");
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE pets
                     SET
                        name = ?1,
                        birth_date = ?2,
                        type_id = ?3,
                        owner_id = ?4
                     WHERE id = ?5;",
                    params![pet.name, pet.birth_date, type_id, owner_id, id],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("pet", id));
                }
                info!("event=pet_save module=repo backend={BACKEND} status=ok mode=update pet_id={id}");
            }
        }
        Ok(())
    }
}

impl PetRepository for SqlPetRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Pet> {
        let pet = query_pets(
            self.conn,
            &format!("{PET_SELECT_SQL} WHERE id = ?1;"),
            [id],
        )?
        .into_iter()
        .next();
        match pet {
            Some(pet) => Ok(pet),
            None => {
                debug!("event=pet_find module=repo backend={BACKEND} status=not_found pet_id={id}");
                Err(RepoError::not_found("pet", id))
            }
        }
    }

    fn find_all(&self) -> RepoResult<Vec<Pet>> {
        query_pets(self.conn, &format!("{PET_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn find_by_owner_id(&self, owner_id: EntityId) -> RepoResult<Vec<Pet>> {
        query_pets(
            self.conn,
            &format!("{PET_SELECT_SQL} WHERE owner_id = ?1 ORDER BY id ASC;"),
            [owner_id],
        )
    }

    fn find_pet_types(&self) -> RepoResult<Vec<PetType>> {
        load_pet_types(self.conn)
    }

    fn save(&self, pet: &mut Pet) -> RepoResult<()> {
        let id = pet.id();
        log_failure(BACKEND, "pet_save", id, self.write(pet))
    }

    fn delete(&self, pet: &Pet) -> RepoResult<()> {
        let Some(pet_id) = pet.id() else {
            return Ok(());
        };
        let started_at = Instant::now();

        match in_unit_of_work(self.conn, |conn| delete_pet_rows(conn, pet_id)) {
            Ok(visits_removed) => {
                info!(
                    "event=pet_delete module=repo backend={BACKEND} status=ok pet_id={pet_id} visits_removed={visits_removed} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=pet_delete module=repo backend={BACKEND} status=error pet_id={pet_id} error={err}"
                );
                Err(err)
            }
        }
    }
}
