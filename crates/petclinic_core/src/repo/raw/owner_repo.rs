//! Owner repository over hand-written statements.
//!
//! Loading an owner is a two-level fan-out: one pet query per owner, one
//! visit query per pet, stitched back into a tree with back-references.

use super::rows::{
    delete_pet_rows, hydrate_pet, load_pet_types, map_owner_row, map_pet_row, query_ids,
    OWNER_SELECT_SQL, PET_SELECT_SQL,
};
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::owner::Owner;
use crate::model::pet::PetType;
use crate::model::{Entity, EntityId};
use crate::repo::{log_failure, like_prefix_pattern, OwnerRepository, RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Instant;

/// SQLite-backed owner repository using explicit queries.
pub struct SqlOwnerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlOwnerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, owner: &mut Owner) -> RepoResult<()> {
        owner.validate()?;

        match owner.id() {
            None => {
                self.conn.execute(
                    "INSERT INTO owners (
                        first_name,
                        last_name,
                        address,
                        city,
                        telephone,
                        state,
                        zip_code
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                    params![
                        owner.first_name,
                        owner.last_name,
                        owner.address,
                        owner.city,
                        owner.telephone,
                        owner.state,
                        owner.zip_code,
                    ],
                )?;
                let id = self.conn.last_insert_rowid();
                owner.assign_id(id);
                info!("event=owner_save module=repo backend={BACKEND} status=ok mode=insert owner_id={id}");
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE owners
                     SET
                        first_name = ?1,
                        last_name = ?2,
                        address = ?3,
                        city = ?4,
                        telephone = ?5,
                        state = ?6,
                        zip_code = ?7
                     WHERE id = ?8;",
                    params![
                        owner.first_name,
                        owner.last_name,
                        owner.address,
                        owner.city,
                        owner.telephone,
                        owner.state,
                        owner.zip_code,
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("owner", id));
                }
                info!("event=owner_save module=repo backend={BACKEND} status=ok mode=update owner_id={id}");
            }
        }
        Ok(())
    }

    /// Assembles pets and visits for every owner, sharing one pet-type set.
    fn hydrate_all(&self, mut owners: Vec<Owner>) -> RepoResult<Vec<Owner>> {
        if owners.is_empty() {
            return Ok(owners);
        }
        let pet_types = load_pet_types(self.conn)?;
        for owner in &mut owners {
            load_pets_and_visits(self.conn, owner, &pet_types)?;
        }
        Ok(owners)
    }

    fn query_owners(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Owner>> {
        let mut stmt = self.conn.prepare(sql)?;
        let owners = stmt
            .query_map(params, map_owner_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        self.hydrate_all(owners)
    }
}

impl OwnerRepository for SqlOwnerRepository<'_> {
    fn find_by_id(&self, id: EntityId) -> RepoResult<Owner> {
        let owner = self
            .conn
            .query_row(
                &format!("{OWNER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                map_owner_row,
            )
            .optional()?;
        let Some(mut owner) = owner else {
            debug!("event=owner_find module=repo backend={BACKEND} status=not_found owner_id={id}");
            return Err(RepoError::not_found("owner", id));
        };

        let pet_types = load_pet_types(self.conn)?;
        load_pets_and_visits(self.conn, &mut owner, &pet_types)?;
        debug!(
            "event=owner_find module=repo backend={BACKEND} status=ok owner_id={id} pets={}",
            owner.pets().len()
        );
        Ok(owner)
    }

    fn find_all(&self) -> RepoResult<Vec<Owner>> {
        self.query_owners(&format!("{OWNER_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn find_by_last_name(&self, prefix: &str) -> RepoResult<Vec<Owner>> {
        let owners = self.query_owners(
            &format!("{OWNER_SELECT_SQL} WHERE last_name LIKE ?1 ESCAPE '\\' ORDER BY id ASC;"),
            [like_prefix_pattern(prefix)],
        )?;
        debug!(
            "event=owner_find_by_last_name module=repo backend={BACKEND} status=ok matches={}",
            owners.len()
        );
        Ok(owners)
    }

    fn save(&self, owner: &mut Owner) -> RepoResult<()> {
        let id = owner.id();
        log_failure(BACKEND, "owner_save", id, self.write(owner))
    }

    fn delete(&self, owner: &Owner) -> RepoResult<()> {
        let Some(owner_id) = owner.id() else {
            return Ok(());
        };
        let started_at = Instant::now();

        let result = in_unit_of_work(self.conn, |conn| {
            let pet_ids = query_ids(
                conn,
                "SELECT id FROM pets WHERE owner_id = ?1 ORDER BY id ASC;",
                [owner_id],
            )?;
            let mut visits_removed = 0;
            for pet_id in &pet_ids {
                visits_removed += delete_pet_rows(conn, *pet_id)?;
            }
            conn.execute("DELETE FROM owners WHERE id = ?1;", [owner_id])?;
            Ok::<_, RepoError>((pet_ids.len(), visits_removed))
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

/// Attaches the owner's pets (id order) and each pet's visits (date order).
///
/// `pet_types` must be the fully materialized type set; an unknown
/// `type_id` is reported as invalid data.
fn load_pets_and_visits(
    conn: &Connection,
    owner: &mut Owner,
    pet_types: &[PetType],
) -> RepoResult<()> {
    let Some(owner_id) = owner.id() else {
        return Ok(());
    };

    let mut stmt = conn.prepare(&format!(
        "{PET_SELECT_SQL} WHERE owner_id = ?1 ORDER BY id ASC;"
    ))?;
    let rows = stmt
        .query_map([owner_id], map_pet_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for row in rows {
        let pet = hydrate_pet(conn, row, pet_types)?;
        owner.add_pet(pet);
    }
    Ok(())
}
