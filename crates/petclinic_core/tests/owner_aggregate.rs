mod common;

use common::{date, owner, pet, seed_clinic, visit};
use petclinic_core::{open_db_in_memory, Entity, ErrorKind, Owner, Profile, Repositories};

#[test]
fn find_by_id_hydrates_pets_and_visits_in_order() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let george = repos
            .owners()
            .find_by_id(clinic.george.id().unwrap())
            .unwrap();
        let names: Vec<_> = george.pets().iter().map(|pet| pet.name.as_str()).collect();
        assert_eq!(names, ["Leo", "Basil"], "{profile}");

        let leo = george.pet_by_name("leo").unwrap();
        assert_eq!(leo.pet_type.name, "cat", "{profile}");
        assert_eq!(leo.owner_id(), george.id(), "{profile}");
        let visits: Vec<_> = leo.visits().iter().map(|visit| visit.date).collect();
        assert_eq!(visits, [date(2013, 1, 1), date(2013, 1, 4)], "{profile}");
        assert!(leo.visits().iter().all(|visit| visit.pet_id() == leo.id()));

        let basil = george.pet_by_id(clinic.basil.id().unwrap()).unwrap();
        assert!(basil.visits().is_empty(), "{profile}");
    }
}

#[test]
fn owner_without_pets_has_empty_collection() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let betty = repos
            .owners()
            .find_by_id(clinic.betty.id().unwrap())
            .unwrap();
        assert!(betty.pets().is_empty(), "{profile}");
    }
}

#[test]
fn missing_owner_is_not_found_not_empty() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);

        let err = repos.owners().find_by_id(404).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{profile}");
        assert!(repos.owners().find_all().unwrap().is_empty(), "{profile}");
    }
}

#[test]
fn last_name_prefix_returns_hydrated_matches_in_id_order() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let harold = owner(&repos, "Harold", "Davis");
        let rosy = pet(&repos, &harold, "Rosy", date(2011, 4, 17), &clinic.dog);
        visit(&repos, &rosy, date(2013, 3, 2), "neutered");
        owner(&repos, "Jean", "Coleman");

        let davises = repos.owners().find_by_last_name("Davis").unwrap();
        let ids: Vec<_> = davises.iter().map(Entity::id).collect();
        assert_eq!(ids, [clinic.betty.id(), harold.id()], "{profile}");
        assert!(davises[0].pets().is_empty(), "{profile}");
        assert_eq!(davises[1].pets().len(), 1, "{profile}");
        assert_eq!(davises[1].pets()[0].visits().len(), 1, "{profile}");
    }
}

#[test]
fn last_name_prefix_treats_wildcards_literally() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        owner(&repos, "Peter", "McTavish");
        owner(&repos, "Maria", "Escobito");

        assert!(repos.owners().find_by_last_name("%").unwrap().is_empty());
        assert!(repos.owners().find_by_last_name("M_T").unwrap().is_empty());
        assert_eq!(repos.owners().find_by_last_name("").unwrap().len(), 2);
    }
}

#[test]
fn find_all_returns_every_owner_fully_hydrated() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let owners = repos.owners().find_all().unwrap();
        assert_eq!(owners.len(), 2, "{profile}");
        let george = owners
            .iter()
            .find(|owner| owner.id() == clinic.george.id())
            .unwrap();
        assert_eq!(george.pets().len(), 2, "{profile}");
        assert_eq!(george.pets()[0].visits().len(), 2, "{profile}");
    }
}

#[test]
fn hydrated_tree_serializes_without_cycles() {
    let conn = open_db_in_memory().unwrap();
    let repos = Repositories::bind(Profile::Raw, &conn);
    let clinic = seed_clinic(&repos);

    let george = repos
        .owners()
        .find_by_id(clinic.george.id().unwrap())
        .unwrap();
    let json = serde_json::to_value(&george).unwrap();
    assert_eq!(json["pets"][0]["name"], "Leo");
    assert_eq!(json["pets"][0]["type"]["name"], "cat");
    assert_eq!(json["pets"][0]["visits"][0]["description"], "rabies shot");

    let restored: Owner = serde_json::from_value(json).unwrap();
    assert_eq!(restored, george);
}

#[test]
fn pet_finders_agree_across_profiles() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);

        let leo = repos.pets().find_by_id(clinic.leo.id().unwrap()).unwrap();
        assert_eq!(leo.visits().len(), 2, "{profile}");

        let pets = repos
            .pets()
            .find_by_owner_id(clinic.george.id().unwrap())
            .unwrap();
        assert_eq!(pets.len(), 2, "{profile}");
        assert_eq!(repos.pets().find_all().unwrap().len(), 2, "{profile}");

        let type_names: Vec<_> = repos
            .pets()
            .find_pet_types()
            .unwrap()
            .into_iter()
            .map(|pet_type| pet_type.name)
            .collect();
        assert_eq!(type_names, ["cat", "dog"], "{profile}");

        let visits = repos
            .visits()
            .find_by_pet_id(clinic.leo.id().unwrap())
            .unwrap();
        assert_eq!(visits[0].description, "rabies shot", "{profile}");
        assert!(repos
            .visits()
            .find_by_pet_id(clinic.basil.id().unwrap())
            .unwrap()
            .is_empty());
    }
}
