mod common;

use common::seed_clinic;
use petclinic_core::{
    open_db_in_memory, ClinicConfig, ClinicService, ConfigError, Entity, Profile, Repositories,
};

#[test]
fn bind_reports_the_selected_profile() {
    let conn = open_db_in_memory().unwrap();
    for profile in Profile::ALL {
        let repos = Repositories::bind(profile, &conn);
        assert_eq!(repos.profile(), profile);
        assert_eq!(
            repos.cached_rows().is_some(),
            profile == Profile::Convention
        );
    }
}

#[test]
fn unknown_profile_is_a_startup_error() {
    let err = ClinicConfig::from_toml_str(r#"profile = "hibernate""#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!("hibernate".parse::<Profile>().is_err());
}

#[test]
fn file_config_opens_a_database_for_the_profile() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("clinic.sqlite3");
    let config_path = dir.path().join("petclinic.toml");
    std::fs::write(
        &config_path,
        format!(
            "profile = \"convention\"\n\n[database]\npath = {:?}\n",
            db_path.to_str().unwrap()
        ),
    )
    .unwrap();

    let config = ClinicConfig::from_toml_str(&std::fs::read_to_string(&config_path).unwrap())
        .unwrap();
    assert_eq!(config.profile, Profile::Convention);

    {
        let conn = config.open_database().unwrap();
        let repos = Repositories::bind(config.profile, &conn);
        seed_clinic(&repos);
    }

    // The same file read through another backend sees the same rows.
    let conn = config.open_database().unwrap();
    let repos = Repositories::bind(Profile::Managed, &conn);
    assert_eq!(repos.owners().find_all().unwrap().len(), 2);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClinicConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn clinic_service_delegates_to_the_bound_backend() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let clinic = seed_clinic(&repos);
        let service = ClinicService::new(&repos);

        assert_eq!(service.profile(), profile);
        let george = service
            .find_owner_by_id(clinic.george.id().unwrap())
            .unwrap();
        assert_eq!(george.pets().len(), 2, "{profile}");
        assert_eq!(service.find_owners_by_last_name("Frank").unwrap().len(), 1);
        assert_eq!(service.find_all_pet_types().unwrap().len(), 2, "{profile}");
        assert_eq!(
            service
                .find_visits_by_pet_id(clinic.leo.id().unwrap())
                .unwrap()
                .len(),
            2,
            "{profile}"
        );

        service.delete_owner(&george).unwrap();
        assert!(service.find_all_pets().unwrap().is_empty(), "{profile}");
        assert!(service.find_all_visits().unwrap().is_empty(), "{profile}");
    }
}
