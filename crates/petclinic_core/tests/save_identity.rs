mod common;

use common::{
    capture_logs, count, date, logged_errors, owner, pet_type, seed_clinic, specialty, vet,
};
use petclinic_core::{
    open_db_in_memory, Entity, ErrorKind, Owner, Pet, PetType, Profile, RepoError, Repositories,
    Specialty, ValidationError, Vet, Visit,
};

#[test]
fn save_assigns_fresh_identity_then_updates_in_place() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let first = owner(&repos, "George", "Franklin");

        let mut owner = Owner::new(
            "Eduardo",
            "Rodriquez",
            "2693 Commerce St.",
            "McFarland",
            "6085558763",
        );
        assert!(owner.is_new());
        repos.owners().save(&mut owner).unwrap();
        let id = owner.id().unwrap();
        assert!(!owner.is_new(), "{profile}");
        assert_ne!(Some(id), first.id(), "{profile}");

        owner.first_name = "Eddie".to_string();
        owner.telephone = "6085550000".to_string();
        owner.state = Some("WI".to_string());
        repos.owners().save(&mut owner).unwrap();
        assert_eq!(owner.id(), Some(id), "{profile}");

        let loaded = repos.owners().find_by_id(id).unwrap();
        assert_eq!(loaded.first_name, "Eddie", "{profile}");
        assert_eq!(loaded.telephone, "6085550000", "{profile}");
        assert_eq!(loaded.state.as_deref(), Some("WI"), "{profile}");
        assert_eq!(loaded.zip_code, None, "{profile}");
        assert_eq!(repos.owners().find_all().unwrap().len(), 2, "{profile}");
    }
}

#[test]
fn updating_a_missing_row_is_not_found() {
    capture_logs();
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);

        let mut ghost = Owner::new("Ghost", "Owner", "", "", "").with_id(77);
        let err = repos.owners().save(&mut ghost).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{profile}");
        assert!(logged_errors("owner_save", profile.as_str()) > 0, "{profile}");
        assert!(repos.owners().find_all().unwrap().is_empty(), "{profile}");
    }
}

#[test]
fn pet_update_rewrites_every_mapped_field() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let mut leo = repos.pets().find_by_id(clinic.leo.id().unwrap()).unwrap();
        leo.name = "Leonard".to_string();
        leo.birth_date = date(2010, 9, 8);
        leo.pet_type = clinic.dog.clone();
        repos.pets().save(&mut leo).unwrap();

        let reloaded = repos.pets().find_by_id(clinic.leo.id().unwrap()).unwrap();
        assert_eq!(reloaded.name, "Leonard", "{profile}");
        assert_eq!(reloaded.birth_date, date(2010, 9, 8), "{profile}");
        assert_eq!(reloaded.pet_type, clinic.dog, "{profile}");
        assert_eq!(reloaded.visits().len(), 2, "{profile}");
    }
}

#[test]
fn invalid_entities_fail_before_any_write() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let mut orphan = Pet::new("Stray", date(2014, 1, 1), clinic.cat.clone());
        let err = repos.pets().save(&mut orphan).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::MissingRelation("pet.owner"))
        ));

        let mut untyped = Pet::new("Mystery", date(2014, 1, 1), PetType::new("unknown"));
        untyped.attach_to_owner(clinic.george.id().unwrap());
        let err = repos.pets().save(&mut untyped).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{profile}");

        let mut loose_visit = Visit::new(date(2014, 1, 1), "walk-in");
        assert_eq!(
            repos.visits().save(&mut loose_visit).unwrap_err().kind(),
            ErrorKind::Validation
        );

        let mut blank = Owner::new("", "Nobody", "", "", "");
        assert_eq!(
            repos.owners().save(&mut blank).unwrap_err().kind(),
            ErrorKind::Validation
        );

        let mut unsaved_specialty = Vet::new("Helen", "Leary");
        unsaved_specialty.add_specialty(Specialty::new("dentistry"));
        assert_eq!(
            repos.vets().save(&mut unsaved_specialty).unwrap_err().kind(),
            ErrorKind::Validation
        );

        assert!(orphan.is_new() && untyped.is_new() && loose_visit.is_new());
        assert_eq!(repos.pets().find_all().unwrap().len(), 2, "{profile}");
        assert!(repos.vets().find_all().unwrap().is_empty(), "{profile}");
    }
}

#[test]
fn vet_save_rewrites_junction_rows() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let radiology = specialty(&repos, "radiology");
        let surgery = specialty(&repos, "surgery");
        let dentistry = specialty(&repos, "dentistry");
        let mut douglas = vet(&repos, "Douglas", &[&surgery, &dentistry]);
        let vet_id = douglas.id().unwrap();

        let loaded = repos.vets().find_by_id(vet_id).unwrap();
        let names: Vec<_> = loaded
            .specialties()
            .iter()
            .map(|specialty| specialty.name.as_str())
            .collect();
        assert_eq!(names, ["dentistry", "surgery"], "{profile}");

        douglas.clear_specialties();
        douglas.add_specialty(radiology.clone());
        douglas.add_specialty(radiology.clone());
        repos.vets().save(&mut douglas).unwrap();

        assert_eq!(douglas.id(), Some(vet_id), "{profile}");
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM vet_specialties WHERE vet_id = ?1;",
                vet_id
            ),
            1,
            "{profile}"
        );
        let reloaded = repos.vets().find_by_id(vet_id).unwrap();
        assert_eq!(reloaded.specialties(), [radiology], "{profile}");
    }
}

#[test]
fn lookup_finders_match_exact_names() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        specialty(&repos, "radiology");
        specialty(&repos, "surgery");
        specialty(&repos, "dentistry");
        let hamster = pet_type(&repos, "hamster");
        pet_type(&repos, "snake");

        let names = vec!["surgery".to_string(), "radiology".to_string(), "none".to_string()];
        let found: Vec<_> = repos
            .specialties()
            .find_by_names(&names)
            .unwrap()
            .into_iter()
            .map(|specialty| specialty.name)
            .collect();
        assert_eq!(found, ["radiology", "surgery"], "{profile}");
        assert!(repos.specialties().find_by_names(&[]).unwrap().is_empty());

        assert_eq!(
            repos.pet_types().find_by_name("hamster").unwrap(),
            [hamster],
            "{profile}"
        );
        assert!(repos.pet_types().find_by_name("ham").unwrap().is_empty());
    }
}

#[test]
fn visit_update_keeps_identity() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let mut visit = repos
            .visits()
            .find_by_pet_id(clinic.leo.id().unwrap())
            .unwrap()
            .remove(0);
        let id = visit.id().unwrap();
        visit.description = "rabies booster".to_string();
        repos.visits().save(&mut visit).unwrap();

        let reloaded = repos.visits().find_by_id(id).unwrap();
        assert_eq!(reloaded.description, "rabies booster", "{profile}");
        assert_eq!(reloaded.pet_id(), clinic.leo.id(), "{profile}");
        assert_eq!(repos.visits().find_all().unwrap().len(), 2, "{profile}");
    }
}
