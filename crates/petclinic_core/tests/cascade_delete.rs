mod common;

use common::{
    capture_logs, count, date, logged_errors, owner, pet, pet_type, seed_clinic, specialty, vet,
    visit,
};
use petclinic_core::{open_db_in_memory, Entity, ErrorKind, Owner, PetType, Profile, Repositories};

#[test]
fn deleting_owner_removes_pets_and_visits() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);
        let other = owner(&repos, "Jean", "Coleman");
        let samantha = pet(&repos, &other, "Samantha", date(2012, 9, 4), &clinic.cat);
        visit(&repos, &samantha, date(2013, 2, 2), "checkup");

        let george_id = clinic.george.id().unwrap();
        let george = repos.owners().find_by_id(george_id).unwrap();
        repos.owners().delete(&george).unwrap();

        let err = repos.owners().find_by_id(george_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{profile}");
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM pets WHERE owner_id = ?1;", george_id),
            0,
            "{profile}"
        );
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM visits WHERE pet_id = ?1;",
                clinic.leo.id().unwrap()
            ),
            0,
            "{profile}"
        );

        // Unrelated rows survive.
        let jean = repos.owners().find_by_id(other.id().unwrap()).unwrap();
        assert_eq!(jean.pets()[0].visits().len(), 1, "{profile}");
    }
}

#[test]
fn deleting_owner_from_stale_reference_still_cascades() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        // `clinic.george` was saved before any pet existed.
        assert!(clinic.george.pets().is_empty());
        repos.owners().delete(&clinic.george).unwrap();

        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM pets WHERE owner_id = ?1;",
                clinic.george.id().unwrap()
            ),
            0,
            "{profile}"
        );
    }
}

#[test]
fn deleting_unsaved_entities_is_a_no_op() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        seed_clinic(&repos);

        repos
            .owners()
            .delete(&Owner::new("New", "Person", "", "", ""))
            .unwrap();
        repos.pet_types().delete(&PetType::new("lizard")).unwrap();
        assert_eq!(repos.owners().find_all().unwrap().len(), 2, "{profile}");
    }
}

#[test]
fn deleting_pet_type_removes_its_pets_and_their_visits() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);
        let bird = pet_type(&repos, "bird");

        let cat_id = clinic.cat.id().unwrap();
        let leo_id = clinic.leo.id().unwrap();
        // Warm any read cache with rows that are about to disappear.
        repos.pets().find_by_id(leo_id).unwrap();
        repos.pet_types().find_by_id(cat_id).unwrap();

        repos.pet_types().delete(&clinic.cat).unwrap();

        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM pets WHERE type_id = ?1;", cat_id),
            0,
            "{profile}"
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM visits WHERE pet_id = ?1;", leo_id),
            0,
            "{profile}"
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM types WHERE id = ?1;", cat_id),
            0,
            "{profile}"
        );

        assert!(repos.pets().find_by_id(leo_id).unwrap_err().is_not_found());
        assert!(repos
            .pet_types()
            .find_by_id(cat_id)
            .unwrap_err()
            .is_not_found());

        // The dog and its owner are untouched.
        let george = repos
            .owners()
            .find_by_id(clinic.george.id().unwrap())
            .unwrap();
        let names: Vec<_> = george.pets().iter().map(|pet| pet.name.as_str()).collect();
        assert_eq!(names, ["Basil"], "{profile}");
        assert!(repos.pet_types().find_by_id(bird.id().unwrap()).is_ok());
    }
}

#[test]
fn deleting_pet_removes_its_visits_first() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);
        let leo_id = clinic.leo.id().unwrap();

        repos.pets().delete(&clinic.leo).unwrap();

        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM visits WHERE pet_id = ?1;", leo_id),
            0,
            "{profile}"
        );
        assert!(repos.pets().find_by_id(leo_id).unwrap_err().is_not_found());
        let george = repos
            .owners()
            .find_by_id(clinic.george.id().unwrap())
            .unwrap();
        assert_eq!(george.pets().len(), 1, "{profile}");
    }
}

#[test]
fn deleting_visit_leaves_pet_in_place() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let visits = repos
            .visits()
            .find_by_pet_id(clinic.leo.id().unwrap())
            .unwrap();
        repos.visits().delete(&visits[0]).unwrap();

        let leo = repos.pets().find_by_id(clinic.leo.id().unwrap()).unwrap();
        assert_eq!(leo.visits().len(), 1, "{profile}");
        assert_eq!(leo.visits()[0].description, "spayed", "{profile}");
    }
}

#[test]
fn deleting_specialty_clears_junction_rows_first() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let radiology = specialty(&repos, "radiology");
        let surgery = specialty(&repos, "surgery");
        let ortega = vet(&repos, "Ortega", &[&surgery, &radiology]);
        let radiology_id = radiology.id().unwrap();

        repos.vets().find_by_id(ortega.id().unwrap()).unwrap();
        repos.specialties().delete(&radiology).unwrap();

        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM vet_specialties WHERE specialty_id = ?1;",
                radiology_id
            ),
            0,
            "{profile}"
        );
        let ortega = repos.vets().find_by_id(ortega.id().unwrap()).unwrap();
        let names: Vec<_> = ortega
            .specialties()
            .iter()
            .map(|specialty| specialty.name.as_str())
            .collect();
        assert_eq!(names, ["surgery"], "{profile}");
        assert!(repos
            .specialties()
            .find_by_id(radiology_id)
            .unwrap_err()
            .is_not_found());
    }
}

#[test]
fn deleting_vet_keeps_specialties() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let surgery = specialty(&repos, "surgery");
        let ortega = vet(&repos, "Ortega", &[&surgery]);

        repos.vets().delete(&ortega).unwrap();

        assert!(repos
            .vets()
            .find_by_id(ortega.id().unwrap())
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM vet_specialties WHERE vet_id = ?1;",
                ortega.id().unwrap()
            ),
            0,
            "{profile}"
        );
        assert_eq!(repos.specialties().find_all().unwrap().len(), 1, "{profile}");
    }
}

#[test]
fn convention_deletes_clear_the_read_cache_last() {
    let conn = open_db_in_memory().unwrap();
    let repos = Repositories::bind(Profile::Convention, &conn);
    let clinic = seed_clinic(&repos);

    repos
        .owners()
        .find_by_id(clinic.george.id().unwrap())
        .unwrap();
    assert!(repos.cached_rows().unwrap() > 0);

    repos.pet_types().delete(&clinic.dog).unwrap();
    assert_eq!(repos.cached_rows(), Some(0));

    let george = repos
        .owners()
        .find_by_id(clinic.george.id().unwrap())
        .unwrap();
    assert_eq!(george.pets().len(), 1);
    assert_eq!(george.pets()[0].name, "Leo");
}

#[test]
fn failed_cascade_leaves_no_partial_effect() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        // A row the cascade does not know about keeps the owner referenced.
        conn.execute_batch(
            "CREATE TABLE invoices (id INTEGER PRIMARY KEY, owner_id INTEGER NOT NULL REFERENCES owners (id));",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO invoices (owner_id) VALUES (?1);",
            [clinic.george.id().unwrap()],
        )
        .unwrap();

        let george = repos
            .owners()
            .find_by_id(clinic.george.id().unwrap())
            .unwrap();
        let err = repos.owners().delete(&george).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage, "{profile}");

        let george = repos
            .owners()
            .find_by_id(clinic.george.id().unwrap())
            .unwrap();
        assert_eq!(george.pets().len(), 2, "{profile}");
        assert_eq!(george.pets()[0].visits().len(), 2, "{profile}");
    }
}

#[test]
fn failed_pet_type_cascade_keeps_pets_and_visits() {
    capture_logs();
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);
        let cat_id = clinic.cat.id().unwrap();
        let leo_id = clinic.leo.id().unwrap();

        conn.execute_batch(
            "CREATE TABLE claims (id INTEGER PRIMARY KEY, type_id INTEGER NOT NULL REFERENCES types (id));",
        )
        .unwrap();
        conn.execute("INSERT INTO claims (type_id) VALUES (?1);", [cat_id])
            .unwrap();

        let err = repos.pet_types().delete(&clinic.cat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage, "{profile}");
        assert!(
            logged_errors("pet_type_delete", profile.as_str()) > 0,
            "{profile}"
        );

        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM pets WHERE id = ?1;", leo_id),
            1,
            "{profile}"
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM visits WHERE pet_id = ?1;", leo_id),
            2,
            "{profile}"
        );
        assert_eq!(repos.pet_types().find_by_id(cat_id).unwrap().name, "cat", "{profile}");
        let leo = repos.pets().find_by_id(leo_id).unwrap();
        assert_eq!(leo.visits().len(), 2, "{profile}");
    }
}

#[test]
fn failed_specialty_cascade_keeps_vet_links() {
    capture_logs();
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let surgery = specialty(&repos, "surgery");
        let surgery_id = surgery.id().unwrap();
        let ortega = vet(&repos, "Ortega", &[&surgery]);

        conn.execute_batch(
            "CREATE TABLE certifications (id INTEGER PRIMARY KEY, specialty_id INTEGER NOT NULL REFERENCES specialties (id));",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO certifications (specialty_id) VALUES (?1);",
            [surgery_id],
        )
        .unwrap();

        let err = repos.specialties().delete(&surgery).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage, "{profile}");
        assert!(
            logged_errors("specialty_delete", profile.as_str()) > 0,
            "{profile}"
        );

        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM vet_specialties WHERE specialty_id = ?1;",
                surgery_id
            ),
            1,
            "{profile}"
        );
        assert_eq!(
            repos.specialties().find_by_id(surgery_id).unwrap().name,
            "surgery",
            "{profile}"
        );
        let ortega = repos.vets().find_by_id(ortega.id().unwrap()).unwrap();
        assert_eq!(ortega.specialties().len(), 1, "{profile}");
    }
}
