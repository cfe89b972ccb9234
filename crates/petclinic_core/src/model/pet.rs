//! Pet and PetType records.

use crate::model::visit::Visit;
use crate::model::{Entity, EntityId, Identity, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of animal. Shared by many pets, owned by none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetType {
    id: Identity,
    pub name: String,
}

impl PetType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identity::New,
            name: name.into(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.assign_id(id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("pet_type.name"));
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
    }
}

impl Entity for PetType {
    fn identity(&self) -> Identity {
        self.id
    }
}

/// Pet owned by exactly one owner.
///
/// # Invariants
/// - `visits` stays ordered by visit date ascending.
/// - `owner` is a non-owning back-reference, set once on attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    id: Identity,
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    owner: Option<EntityId>,
    #[serde(default)]
    visits: Vec<Visit>,
}

impl Pet {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate, pet_type: PetType) -> Self {
        Self {
            id: Identity::New,
            name: name.into(),
            birth_date,
            pet_type,
            owner: None,
            visits: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.assign_id(id);
        self
    }

    /// Id of the owning owner, once attached.
    pub fn owner_id(&self) -> Option<EntityId> {
        self.owner
    }

    /// Sets the owner back-reference. A pet already attached keeps its owner.
    pub fn attach_to_owner(&mut self, owner_id: EntityId) {
        if self.owner.is_none() {
            self.owner = Some(owner_id);
        }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Attaches `visit` in date order (stable for equal dates).
    pub fn add_visit(&mut self, mut visit: Visit) {
        if let Some(id) = self.id() {
            visit.attach_to_pet(id);
        }
        let position = self
            .visits
            .partition_point(|existing| existing.date <= visit.date);
        self.visits.insert(position, visit);
    }

    /// Checks the relationships a pet row needs before it can be written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("pet.name"));
        }
        if self.owner.is_none() {
            return Err(ValidationError::MissingRelation("pet.owner"));
        }
        if self.pet_type.is_new() {
            return Err(ValidationError::MissingRelation("pet.type"));
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
        if let Some(id) = self.id() {
            for visit in &mut self.visits {
                visit.attach_to_pet(id);
            }
        }
    }
}

impl Entity for Pet {
    fn identity(&self) -> Identity {
        self.id
    }
}
