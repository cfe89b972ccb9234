//! Owner aggregate root.

use crate::model::pet::Pet;
use crate::model::{find_by_id, Entity, EntityId, Identity, ValidationError};
use serde::{Deserialize, Serialize};

/// Pet owner; root of the `Owner -> Pet -> Visit` aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    id: Identity,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub telephone: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    /// Ordered by pet id when loaded from storage.
    #[serde(default)]
    pets: Vec<Pet>,
}

impl Owner {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            id: Identity::New,
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
            city: city.into(),
            telephone: telephone.into(),
            state: None,
            zip_code: None,
            pets: Vec::new(),
        }
    }

    /// Marks this owner as referring to an existing row.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.assign_id(id);
        self
    }

    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    /// Attaches `pet`, setting its owner back-reference when unset.
    pub fn add_pet(&mut self, mut pet: Pet) {
        if let Some(id) = self.id() {
            pet.attach_to_owner(id);
        }
        self.pets.push(pet);
    }

    /// Case-insensitive lookup over attached pets.
    pub fn pet_by_name(&self, name: &str) -> Option<&Pet> {
        self.pets
            .iter()
            .find(|pet| pet.name.eq_ignore_ascii_case(name))
    }

    pub fn pet_by_id(&self, id: EntityId) -> Option<&Pet> {
        find_by_id(&self.pets, id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::BlankField("owner.first_name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::BlankField("owner.last_name"));
        }
        Ok(())
    }

    /// Assigns the storage id and completes pending pet back-references.
    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
        if let Some(id) = self.id() {
            for pet in &mut self.pets {
                pet.attach_to_owner(id);
            }
        }
    }
}

impl Entity for Owner {
    fn identity(&self) -> Identity {
        self.id
    }
}
