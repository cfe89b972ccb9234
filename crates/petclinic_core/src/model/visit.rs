//! Visit record.

use crate::model::{Entity, EntityId, Identity, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One clinic visit. Cannot exist without its pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    id: Identity,
    pub date: NaiveDate,
    pub description: String,
    pet: Option<EntityId>,
}

impl Visit {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: Identity::New,
            date,
            description: description.into(),
            pet: None,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.assign_id(id);
        self
    }

    pub fn pet_id(&self) -> Option<EntityId> {
        self.pet
    }

    /// Sets the pet back-reference. A visit already attached keeps its pet.
    pub fn attach_to_pet(&mut self, pet_id: EntityId) {
        if self.pet.is_none() {
            self.pet = Some(pet_id);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pet.is_none() {
            return Err(ValidationError::MissingRelation("visit.pet"));
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
    }
}

impl Entity for Visit {
    fn identity(&self) -> Identity {
        self.id
    }
}
