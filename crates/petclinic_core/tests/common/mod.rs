#![allow(dead_code)]

use chrono::NaiveDate;
use petclinic_core::{Entity, EntityId, Owner, Pet, PetType, Repositories, Specialty, Vet, Visit};
use rusqlite::Connection;
use std::sync::Mutex;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn count(conn: &Connection, sql: &str, id: EntityId) -> i64 {
    conn.query_row(sql, [id], |row| row.get(0)).unwrap()
}

pub fn pet_type(repos: &Repositories<'_>, name: &str) -> PetType {
    let mut pet_type = PetType::new(name);
    repos.pet_types().save(&mut pet_type).unwrap();
    pet_type
}

pub fn owner(repos: &Repositories<'_>, first_name: &str, last_name: &str) -> Owner {
    let mut owner = Owner::new(
        first_name,
        last_name,
        "110 W. Liberty St.",
        "Madison",
        "6085551023",
    );
    repos.owners().save(&mut owner).unwrap();
    owner
}

pub fn pet(
    repos: &Repositories<'_>,
    owner: &Owner,
    name: &str,
    birth_date: NaiveDate,
    pet_type: &PetType,
) -> Pet {
    let mut pet = Pet::new(name, birth_date, pet_type.clone());
    pet.attach_to_owner(owner.id().unwrap());
    repos.pets().save(&mut pet).unwrap();
    pet
}

pub fn visit(repos: &Repositories<'_>, pet: &Pet, on: NaiveDate, description: &str) -> Visit {
    let mut visit = Visit::new(on, description);
    visit.attach_to_pet(pet.id().unwrap());
    repos.visits().save(&mut visit).unwrap();
    visit
}

pub fn specialty(repos: &Repositories<'_>, name: &str) -> Specialty {
    let mut specialty = Specialty::new(name);
    repos.specialties().save(&mut specialty).unwrap();
    specialty
}

pub fn vet(repos: &Repositories<'_>, last_name: &str, specialties: &[&Specialty]) -> Vet {
    let mut vet = Vet::new("James", last_name);
    for specialty in specialties {
        vet.add_specialty((*specialty).clone());
    }
    repos.vets().save(&mut vet).unwrap();
    vet
}

/// Ids of a small seeded clinic.
pub struct Clinic {
    pub cat: PetType,
    pub dog: PetType,
    /// Owner with two pets: Leo (cat, two visits) and Basil (dog, no visits).
    pub george: Owner,
    /// Owner without pets.
    pub betty: Owner,
    pub leo: Pet,
    pub basil: Pet,
}

pub fn seed_clinic(repos: &Repositories<'_>) -> Clinic {
    let dog = pet_type(repos, "dog");
    let cat = pet_type(repos, "cat");
    let george = owner(repos, "George", "Franklin");
    let betty = owner(repos, "Betty", "Davis");

    let leo = pet(repos, &george, "Leo", date(2010, 9, 7), &cat);
    let basil = pet(repos, &george, "Basil", date(2012, 8, 6), &dog);
    // Inserted out of date order on purpose.
    visit(repos, &leo, date(2013, 1, 4), "spayed");
    visit(repos, &leo, date(2013, 1, 1), "rabies shot");

    Clinic {
        cat,
        dog,
        george,
        betty,
        leo,
        basil,
    }
}

struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("{} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

/// Routes this test binary's log records into memory. Safe to call repeatedly.
pub fn capture_logs() {
    let _ = log::set_logger(&CAPTURE).map(|()| log::set_max_level(log::LevelFilter::Debug));
}

/// Number of captured `ERROR` lines for `event` on `backend`.
pub fn logged_errors(event: &str, backend: &str) -> usize {
    let event = format!("event={event} ");
    let backend = format!("backend={backend} ");
    CAPTURE
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|line| {
            line.starts_with("ERROR ")
                && line.contains(&event)
                && line.contains(&backend)
                && line.contains("status=error")
        })
        .count()
}
