//! Vet and Specialty records.

use crate::model::{Entity, EntityId, Identity, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    id: Identity,
    pub name: String,
}

impl Specialty {
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
            return Err(ValidationError::BlankField("specialty.name"));
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
    }
}

impl Entity for Specialty {
    fn identity(&self) -> Identity {
        self.id
    }
}

/// Veterinarian with a many-to-many set of specialties.
///
/// # Invariants
/// - `specialties` holds no duplicates (by id, or by name while new).
/// - `specialties()` is sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vet {
    id: Identity,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    specialties: Vec<Specialty>,
}

impl Vet {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: Identity::New,
            first_name: first_name.into(),
            last_name: last_name.into(),
            specialties: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.assign_id(id);
        self
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    pub fn add_specialty(&mut self, specialty: Specialty) {
        let duplicate = self.specialties.iter().any(|existing| match specialty.id() {
            Some(id) => existing.id() == Some(id),
            None => existing.is_new() && existing.name == specialty.name,
        });
        if duplicate {
            return;
        }
        let position = self
            .specialties
            .partition_point(|existing| existing.name <= specialty.name);
        self.specialties.insert(position, specialty);
    }

    pub fn clear_specialties(&mut self) {
        self.specialties.clear();
    }

    /// Ids for the junction rows. Every specialty must already be persisted.
    pub fn specialty_ids(&self) -> Result<Vec<EntityId>, ValidationError> {
        self.specialties
            .iter()
            .map(|specialty| {
                specialty
                    .id()
                    .ok_or(ValidationError::MissingRelation("vet.specialties"))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::BlankField("vet.last_name"));
        }
        self.specialty_ids().map(|_| ())
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id.assign(id);
    }
}

impl Entity for Vet {
    fn identity(&self) -> Identity {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Specialty, Vet};

    #[test]
    fn specialties_behave_as_sorted_set() {
        let mut vet = Vet::new("Helen", "Leary");
        vet.add_specialty(Specialty::new("surgery").with_id(2));
        vet.add_specialty(Specialty::new("radiology").with_id(1));
        vet.add_specialty(Specialty::new("surgery").with_id(2));

        let names: Vec<_> = vet.specialties().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["radiology", "surgery"]);
    }

    #[test]
    fn unsaved_specialty_fails_validation() {
        let mut vet = Vet::new("Helen", "Leary");
        vet.add_specialty(Specialty::new("dentistry"));
        assert!(vet.validate().is_err());
    }
}
