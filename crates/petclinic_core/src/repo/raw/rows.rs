//! Row mappers and load helpers shared by the raw-statement repositories.

use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetType};
use crate::model::vet::Specialty;
use crate::model::visit::Visit;
use crate::model::{find_by_id, EntityId};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{Connection, Row};

pub(super) const OWNER_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    address,
    city,
    telephone,
    state,
    zip_code
FROM owners";

pub(super) const PET_SELECT_SQL: &str = "SELECT
    id,
    name,
    birth_date,
    type_id,
    owner_id
FROM pets";

pub(super) const VISIT_SELECT_SQL: &str = "SELECT
    id,
    pet_id,
    visit_date,
    description
FROM visits";

/// Pet row before its type and visits are resolved.
pub(super) struct PetRow {
    pub id: EntityId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub type_id: EntityId,
    pub owner_id: EntityId,
}

pub(super) fn map_owner_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    let mut owner = Owner::new(
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
        row.get::<_, String>("address")?,
        row.get::<_, String>("city")?,
        row.get::<_, String>("telephone")?,
    )
    .with_id(row.get("id")?);
    owner.state = row.get("state")?;
    owner.zip_code = row.get("zip_code")?;
    Ok(owner)
}

pub(super) fn map_pet_row(row: &Row<'_>) -> rusqlite::Result<PetRow> {
    Ok(PetRow {
        id: row.get("id")?,
        name: row.get("name")?,
        birth_date: row.get("birth_date")?,
        type_id: row.get("type_id")?,
        owner_id: row.get("owner_id")?,
    })
}

pub(super) fn map_visit_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    let mut visit = Visit::new(
        row.get::<_, NaiveDate>("visit_date")?,
        row.get::<_, String>("description")?,
    )
    .with_id(row.get("id")?);
    visit.attach_to_pet(row.get("pet_id")?);
    Ok(visit)
}

pub(super) fn map_pet_type_row(row: &Row<'_>) -> rusqlite::Result<PetType> {
    Ok(PetType::new(row.get::<_, String>("name")?).with_id(row.get("id")?))
}

pub(super) fn map_specialty_row(row: &Row<'_>) -> rusqlite::Result<Specialty> {
    Ok(Specialty::new(row.get::<_, String>("name")?).with_id(row.get("id")?))
}

/// Fully materializes every pet type, ordered by name.
pub(super) fn load_pet_types(conn: &Connection) -> RepoResult<Vec<PetType>> {
    let mut stmt = conn.prepare("SELECT id, name FROM types ORDER BY name ASC, id ASC;")?;
    let pet_types = stmt
        .query_map([], map_pet_type_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pet_types)
}

/// Visits of one pet, ordered by date then id.
pub(super) fn load_visits(conn: &Connection, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
    let mut stmt = conn.prepare(&format!(
        "{VISIT_SELECT_SQL} WHERE pet_id = ?1 ORDER BY visit_date ASC, id ASC;"
    ))?;
    let visits = stmt
        .query_map([pet_id], map_visit_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(visits)
}

/// Resolves the type from `pet_types` and attaches the pet's visits.
pub(super) fn hydrate_pet(
    conn: &Connection,
    row: PetRow,
    pet_types: &[PetType],
) -> RepoResult<Pet> {
    let pet_type = find_by_id(pet_types, row.type_id).cloned().ok_or_else(|| {
        RepoError::InvalidData(format!(
            "pet {} references unknown type {} in pets.type_id",
            row.id, row.type_id
        ))
    })?;

    let mut pet = Pet::new(row.name, row.birth_date, pet_type).with_id(row.id);
    pet.attach_to_owner(row.owner_id);
    for visit in load_visits(conn, row.id)? {
        pet.add_visit(visit);
    }
    Ok(pet)
}

/// Runs a pet query and hydrates every returned row.
pub(super) fn query_pets(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Vec<Pet>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_pet_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let pet_types = load_pet_types(conn)?;
    rows.into_iter()
        .map(|row| hydrate_pet(conn, row, &pet_types))
        .collect()
}

/// Deletes one pet's visits, then the pet row.
pub(super) fn delete_pet_rows(conn: &Connection, pet_id: EntityId) -> RepoResult<usize> {
    let visits = conn.execute("DELETE FROM visits WHERE pet_id = ?1;", [pet_id])?;
    conn.execute("DELETE FROM pets WHERE id = ?1;", [pet_id])?;
    Ok(visits)
}

/// Ids selected by a single-column query.
pub(super) fn query_ids(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get::<_, EntityId>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}
