//! Table mappings for entities the [`EntityManager`] can manage.
//!
//! Each mapping names its table and select list, reads a flat record, and
//! resolves the record's relationships back through the manager so shared
//! rows (pet types, specialties) come from the identity map.

use super::entity_manager::EntityManager;
use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetType};
use crate::model::vet::{Specialty, Vet};
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId, ValidationError};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

pub(crate) trait ManagedEntity: Entity + Clone + 'static {
    const TABLE: &'static str;
    /// Entity name used in not-found errors.
    const NAME: &'static str;
    /// Select list; the first column is always `id`.
    const COLUMNS: &'static str;

    type Record;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, Self::Record)>;

    fn resolve(em: &EntityManager<'_>, id: EntityId, record: Self::Record) -> RepoResult<Self>;

    /// Writes a new row (and owned link rows) and returns its id.
    fn insert(&self, conn: &Connection) -> RepoResult<EntityId>;

    /// Rewrites the row; returns the number of rows the main update hit.
    fn update(&self, conn: &Connection) -> RepoResult<usize>;

    fn delete_row(conn: &Connection, id: EntityId) -> RepoResult<()> {
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1;", Self::TABLE), [id])?;
        Ok(())
    }

    fn assign_id(&mut self, id: EntityId);
}

fn persisted_id<E: Entity>(entity: &E, name: &'static str) -> RepoResult<EntityId> {
    entity.id().ok_or_else(|| {
        RepoError::InvalidData(format!("{name} has no identity to write"))
    })
}

impl ManagedEntity for Owner {
    const TABLE: &'static str = "owners";
    const NAME: &'static str = "owner";
    const COLUMNS: &'static str =
        "id, first_name, last_name, address, city, telephone, state, zip_code";

    type Record = Owner;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, Owner)> {
        let mut owner = Owner::new(
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        );
        owner.state = row.get(6)?;
        owner.zip_code = row.get(7)?;
        Ok((row.get(0)?, owner))
    }

    fn resolve(em: &EntityManager<'_>, id: EntityId, record: Owner) -> RepoResult<Self> {
        let mut owner = record.with_id(id);
        for pet in em.query::<Pet, _>("WHERE owner_id = ?1 ORDER BY id ASC", [id])? {
            owner.add_pet(pet);
        }
        Ok(owner)
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        conn.execute(
            "INSERT INTO owners (first_name, last_name, address, city, telephone, state, zip_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                self.first_name,
                self.last_name,
                self.address,
                self.city,
                self.telephone,
                self.state,
                self.zip_code,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        Ok(conn.execute(
            "UPDATE owners
             SET first_name = ?1, last_name = ?2, address = ?3, city = ?4,
                 telephone = ?5, state = ?6, zip_code = ?7
             WHERE id = ?8;",
            params![
                self.first_name,
                self.last_name,
                self.address,
                self.city,
                self.telephone,
                self.state,
                self.zip_code,
                id,
            ],
        )?)
    }

    fn assign_id(&mut self, id: EntityId) {
        Owner::assign_id(self, id);
    }
}

pub(crate) struct PetRecord {
    name: String,
    birth_date: NaiveDate,
    type_id: EntityId,
    owner_id: EntityId,
}

impl ManagedEntity for Pet {
    const TABLE: &'static str = "pets";
    const NAME: &'static str = "pet";
    const COLUMNS: &'static str = "id, name, birth_date, type_id, owner_id";

    type Record = PetRecord;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, PetRecord)> {
        Ok((
            row.get(0)?,
            PetRecord {
                name: row.get(1)?,
                birth_date: row.get(2)?,
                type_id: row.get(3)?,
                owner_id: row.get(4)?,
            },
        ))
    }

    fn resolve(em: &EntityManager<'_>, id: EntityId, record: PetRecord) -> RepoResult<Self> {
        let pet_type = em.find::<PetType>(record.type_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "pet {id} references unknown type {} in pets.type_id",
                record.type_id
            ))
        })?;

        let mut pet = Pet::new(record.name, record.birth_date, pet_type).with_id(id);
        pet.attach_to_owner(record.owner_id);
        for visit in em.query::<Visit, _>(
            "WHERE pet_id = ?1 ORDER BY visit_date ASC, id ASC",
            [id],
        )? {
            pet.add_visit(visit);
        }
        Ok(pet)
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        let owner_id = self
            .owner_id()
            .ok_or(ValidationError::MissingRelation("pet.owner"))?;
        let type_id = persisted_id(&self.pet_type, PetType::NAME)?;
        conn.execute(
            "INSERT INTO pets (name, birth_date, type_id, owner_id) VALUES (?1, ?2, ?3, ?4);",
            params![self.name, self.birth_date, type_id, owner_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        let owner_id = self
            .owner_id()
            .ok_or(ValidationError::MissingRelation("pet.owner"))?;
        let type_id = persisted_id(&self.pet_type, PetType::NAME)?;
        Ok(conn.execute(
            "UPDATE pets SET name = ?1, birth_date = ?2, type_id = ?3, owner_id = ?4 WHERE id = ?5;",
            params![self.name, self.birth_date, type_id, owner_id, id],
        )?)
    }

    fn assign_id(&mut self, id: EntityId) {
        Pet::assign_id(self, id);
    }
}

impl ManagedEntity for Visit {
    const TABLE: &'static str = "visits";
    const NAME: &'static str = "visit";
    const COLUMNS: &'static str = "id, pet_id, visit_date, description";

    type Record = Visit;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, Visit)> {
        let mut visit = Visit::new(row.get::<_, NaiveDate>(2)?, row.get::<_, String>(3)?);
        visit.attach_to_pet(row.get(1)?);
        Ok((row.get(0)?, visit))
    }

    fn resolve(_em: &EntityManager<'_>, id: EntityId, record: Visit) -> RepoResult<Self> {
        Ok(record.with_id(id))
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        let pet_id = self
            .pet_id()
            .ok_or(ValidationError::MissingRelation("visit.pet"))?;
        conn.execute(
            "INSERT INTO visits (pet_id, visit_date, description) VALUES (?1, ?2, ?3);",
            params![pet_id, self.date, self.description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        let pet_id = self
            .pet_id()
            .ok_or(ValidationError::MissingRelation("visit.pet"))?;
        Ok(conn.execute(
            "UPDATE visits SET pet_id = ?1, visit_date = ?2, description = ?3 WHERE id = ?4;",
            params![pet_id, self.date, self.description, id],
        )?)
    }

    fn assign_id(&mut self, id: EntityId) {
        Visit::assign_id(self, id);
    }
}

impl ManagedEntity for PetType {
    const TABLE: &'static str = "types";
    const NAME: &'static str = "pet type";
    const COLUMNS: &'static str = "id, name";

    type Record = String;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, String)> {
        Ok((row.get(0)?, row.get(1)?))
    }

    fn resolve(_em: &EntityManager<'_>, id: EntityId, name: String) -> RepoResult<Self> {
        Ok(PetType::new(name).with_id(id))
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        conn.execute("INSERT INTO types (name) VALUES (?1);", [&self.name])?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        Ok(conn.execute(
            "UPDATE types SET name = ?1 WHERE id = ?2;",
            params![self.name, id],
        )?)
    }

    fn assign_id(&mut self, id: EntityId) {
        PetType::assign_id(self, id);
    }
}

impl ManagedEntity for Specialty {
    const TABLE: &'static str = "specialties";
    const NAME: &'static str = "specialty";
    const COLUMNS: &'static str = "id, name";

    type Record = String;

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, String)> {
        Ok((row.get(0)?, row.get(1)?))
    }

    fn resolve(_em: &EntityManager<'_>, id: EntityId, name: String) -> RepoResult<Self> {
        Ok(Specialty::new(name).with_id(id))
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        conn.execute("INSERT INTO specialties (name) VALUES (?1);", [&self.name])?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        Ok(conn.execute(
            "UPDATE specialties SET name = ?1 WHERE id = ?2;",
            params![self.name, id],
        )?)
    }

    fn assign_id(&mut self, id: EntityId) {
        Specialty::assign_id(self, id);
    }
}

impl ManagedEntity for Vet {
    const TABLE: &'static str = "vets";
    const NAME: &'static str = "vet";
    const COLUMNS: &'static str = "id, first_name, last_name";

    type Record = (String, String);

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EntityId, (String, String))> {
        Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
    }

    fn resolve(
        em: &EntityManager<'_>,
        id: EntityId,
        (first_name, last_name): (String, String),
    ) -> RepoResult<Self> {
        let mut vet = Vet::new(first_name, last_name).with_id(id);
        for specialty in em.query::<Specialty, _>(
            "WHERE id IN (SELECT specialty_id FROM vet_specialties WHERE vet_id = ?1)
             ORDER BY name ASC, id ASC",
            [id],
        )? {
            vet.add_specialty(specialty);
        }
        Ok(vet)
    }

    fn insert(&self, conn: &Connection) -> RepoResult<EntityId> {
        conn.execute(
            "INSERT INTO vets (first_name, last_name) VALUES (?1, ?2);",
            params![self.first_name, self.last_name],
        )?;
        let id = conn.last_insert_rowid();
        write_specialty_links(conn, id, &self.specialty_ids()?)?;
        Ok(id)
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let id = persisted_id(self, Self::NAME)?;
        let changed = conn.execute(
            "UPDATE vets SET first_name = ?1, last_name = ?2 WHERE id = ?3;",
            params![self.first_name, self.last_name, id],
        )?;
        if changed > 0 {
            write_specialty_links(conn, id, &self.specialty_ids()?)?;
        }
        Ok(changed)
    }

    fn delete_row(conn: &Connection, id: EntityId) -> RepoResult<()> {
        conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [id])?;
        conn.execute("DELETE FROM vets WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn assign_id(&mut self, id: EntityId) {
        Vet::assign_id(self, id);
    }
}

/// Replaces the vet's junction rows with `specialty_ids`.
fn write_specialty_links(
    conn: &Connection,
    vet_id: EntityId,
    specialty_ids: &[EntityId],
) -> RepoResult<()> {
    conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [vet_id])?;
    for specialty_id in specialty_ids {
        conn.execute(
            "INSERT INTO vet_specialties (vet_id, specialty_id) VALUES (?1, ?2);",
            params![vet_id, specialty_id],
        )?;
    }
    Ok(())
}
