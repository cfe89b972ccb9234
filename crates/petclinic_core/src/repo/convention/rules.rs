//! Declarative table rules and the entity mappings generated from them.

use super::session::ConventionSession;
use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetType};
use crate::model::vet::{Specialty, Vet};
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId, ValidationError};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

/// Where an entity lives and how its rows are listed.
pub(crate) struct TableRules {
    pub table: &'static str,
    /// Entity name used in not-found errors.
    pub entity: &'static str,
    /// Mapped columns other than `id`, in value order.
    pub columns: &'static [&'static str],
    pub default_order: &'static str,
}

pub(crate) trait Conventional: Entity + Sized {
    const RULES: TableRules;

    /// Column values in `RULES.columns` order.
    fn to_values(&self) -> RepoResult<Vec<Value>>;

    /// Rebuilds the entity and loads its eager relations.
    fn from_values(session: &ConventionSession<'_>, row: RowValues) -> RepoResult<Self>;

    fn assign_id(&mut self, id: EntityId);

    /// Writes rows owned by the entity outside its own table.
    fn write_links(&self, _conn: &Connection, _id: EntityId) -> RepoResult<()> {
        Ok(())
    }
}

/// Sequential reader over one row's column values.
pub(crate) struct RowValues {
    entity: &'static str,
    id: EntityId,
    values: std::vec::IntoIter<Value>,
}

impl RowValues {
    pub(crate) fn new(entity: &'static str, id: EntityId, values: Vec<Value>) -> Self {
        Self {
            entity,
            id,
            values: values.into_iter(),
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    fn next(&mut self) -> RepoResult<Value> {
        self.values
            .next()
            .ok_or_else(|| self.invalid("missing column value"))
    }

    fn text(&mut self) -> RepoResult<String> {
        match self.next()? {
            Value::Text(text) => Ok(text),
            other => Err(self.invalid(format!("expected text, found {other:?}"))),
        }
    }

    fn optional_text(&mut self) -> RepoResult<Option<String>> {
        match self.next()? {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text)),
            other => Err(self.invalid(format!("expected text or null, found {other:?}"))),
        }
    }

    fn integer(&mut self) -> RepoResult<i64> {
        match self.next()? {
            Value::Integer(value) => Ok(value),
            other => Err(self.invalid(format!("expected integer, found {other:?}"))),
        }
    }

    fn date(&mut self) -> RepoResult<NaiveDate> {
        let text = self.text()?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|err| self.invalid(format!("unparsable date {text:?}: {err}")))
    }

    fn invalid(&self, message: impl Into<String>) -> RepoError {
        RepoError::InvalidData(format!(
            "{} {}: {}",
            self.entity,
            self.id,
            message.into()
        ))
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn date(value: NaiveDate) -> Value {
    Value::Text(value.format("%Y-%m-%d").to_string())
}

impl Conventional for Owner {
    const RULES: TableRules = TableRules {
        table: "owners",
        entity: "owner",
        columns: &[
            "first_name",
            "last_name",
            "address",
            "city",
            "telephone",
            "state",
            "zip_code",
        ],
        default_order: "id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.first_name),
            text(&self.last_name),
            text(&self.address),
            text(&self.city),
            text(&self.telephone),
            optional_text(self.state.as_deref()),
            optional_text(self.zip_code.as_deref()),
        ])
    }

    fn from_values(session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        let mut owner = Owner::new(
            row.text()?,
            row.text()?,
            row.text()?,
            row.text()?,
            row.text()?,
        )
        .with_id(id);
        owner.state = row.optional_text()?;
        owner.zip_code = row.optional_text()?;
        for pet in session.find_by::<Pet, _>("owner_id", id)? {
            owner.add_pet(pet);
        }
        Ok(owner)
    }

    fn assign_id(&mut self, id: EntityId) {
        Owner::assign_id(self, id);
    }
}

impl Conventional for Pet {
    const RULES: TableRules = TableRules {
        table: "pets",
        entity: "pet",
        columns: &["name", "birth_date", "type_id", "owner_id"],
        default_order: "id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        let type_id = self
            .pet_type
            .id()
            .ok_or(ValidationError::MissingRelation("pet.type"))?;
        let owner_id = self
            .owner_id()
            .ok_or(ValidationError::MissingRelation("pet.owner"))?;
        Ok(vec![
            text(&self.name),
            date(self.birth_date),
            Value::Integer(type_id),
            Value::Integer(owner_id),
        ])
    }

    fn from_values(session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        let name = row.text()?;
        let birth_date = row.date()?;
        let type_id = row.integer()?;
        let owner_id = row.integer()?;

        let pet_type = match session.find_by_id::<PetType>(type_id) {
            Ok(pet_type) => pet_type,
            Err(err) if err.is_not_found() => {
                return Err(RepoError::InvalidData(format!(
                    "pet {id} references unknown type {type_id} in pets.type_id"
                )));
            }
            Err(err) => return Err(err),
        };

        let mut pet = Pet::new(name, birth_date, pet_type).with_id(id);
        pet.attach_to_owner(owner_id);
        for visit in session.find_by::<Visit, _>("pet_id", id)? {
            pet.add_visit(visit);
        }
        Ok(pet)
    }

    fn assign_id(&mut self, id: EntityId) {
        Pet::assign_id(self, id);
    }
}

impl Conventional for Visit {
    const RULES: TableRules = TableRules {
        table: "visits",
        entity: "visit",
        columns: &["pet_id", "visit_date", "description"],
        default_order: "visit_date ASC, id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        let pet_id = self
            .pet_id()
            .ok_or(ValidationError::MissingRelation("visit.pet"))?;
        Ok(vec![
            Value::Integer(pet_id),
            date(self.date),
            text(&self.description),
        ])
    }

    fn from_values(_session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        let pet_id = row.integer()?;
        let mut visit = Visit::new(row.date()?, row.text()?).with_id(id);
        visit.attach_to_pet(pet_id);
        Ok(visit)
    }

    fn assign_id(&mut self, id: EntityId) {
        Visit::assign_id(self, id);
    }
}

impl Conventional for PetType {
    const RULES: TableRules = TableRules {
        table: "types",
        entity: "pet type",
        columns: &["name"],
        default_order: "name ASC, id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![text(&self.name)])
    }

    fn from_values(_session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        Ok(PetType::new(row.text()?).with_id(id))
    }

    fn assign_id(&mut self, id: EntityId) {
        PetType::assign_id(self, id);
    }
}

impl Conventional for Specialty {
    const RULES: TableRules = TableRules {
        table: "specialties",
        entity: "specialty",
        columns: &["name"],
        default_order: "name ASC, id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![text(&self.name)])
    }

    fn from_values(_session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        Ok(Specialty::new(row.text()?).with_id(id))
    }

    fn assign_id(&mut self, id: EntityId) {
        Specialty::assign_id(self, id);
    }
}

impl Conventional for Vet {
    const RULES: TableRules = TableRules {
        table: "vets",
        entity: "vet",
        columns: &["first_name", "last_name"],
        default_order: "id ASC",
    };

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![text(&self.first_name), text(&self.last_name)])
    }

    fn from_values(session: &ConventionSession<'_>, mut row: RowValues) -> RepoResult<Self> {
        let id = row.id();
        let mut vet = Vet::new(row.text()?, row.text()?).with_id(id);
        for specialty in
            session.find_linked::<Specialty>("vet_specialties", "specialty_id", "vet_id", id)?
        {
            vet.add_specialty(specialty);
        }
        Ok(vet)
    }

    fn assign_id(&mut self, id: EntityId) {
        Vet::assign_id(self, id);
    }

    fn write_links(&self, conn: &Connection, id: EntityId) -> RepoResult<()> {
        let specialty_ids = self.specialty_ids()?;
        conn.execute("DELETE FROM vet_specialties WHERE vet_id = ?1;", [id])?;
        for specialty_id in specialty_ids {
            conn.execute(
                "INSERT INTO vet_specialties (vet_id, specialty_id) VALUES (?1, ?2);",
                params![id, specialty_id],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RowValues;
    use crate::repo::ErrorKind;
    use chrono::NaiveDate;
    use rusqlite::types::Value;

    #[test]
    fn row_values_read_in_column_order() {
        let mut row = RowValues::new(
            "visit",
            4,
            vec![
                Value::Integer(7),
                Value::Text("2013-01-01".to_string()),
                Value::Null,
            ],
        );
        assert_eq!(row.integer().unwrap(), 7);
        assert_eq!(
            row.date().unwrap(),
            NaiveDate::from_ymd_opt(2013, 1, 1).unwrap()
        );
        assert_eq!(row.optional_text().unwrap(), None);
        assert!(row.text().is_err());
    }

    #[test]
    fn malformed_values_are_invalid_data() {
        let mut row = RowValues::new("pet", 1, vec![Value::Text("not a date".to_string())]);
        let err = row.date().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("pet 1"));
    }
}
