use petclinic_core::{
    open_db_in_memory, ErrorKind, Profile, RepoError, Repositories, User, UserService,
    ValidationError,
};
use rusqlite::Connection;

fn role_rows(conn: &Connection, username: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT role FROM roles WHERE username = ?1 ORDER BY role ASC;")
        .unwrap();
    stmt.query_map([username], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn user_without_roles_is_rejected_before_any_write() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let service = UserService::new(repos.users());

        let mut user = User::new("admin", "admin", true);
        let err = service.save_user(&mut user).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::MissingRoles)
        ));
        assert!(user.is_new(), "{profile}");
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0, "{profile}");
    }
}

#[test]
fn role_names_are_normalized_and_linked_back() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let service = UserService::new(repos.users());

        let mut user = User::new("admin", "admin", true);
        user.add_role("OWNER_ADMIN");
        user.add_role(" vet_admin ");
        user.add_role("ROLE_ADMIN");
        service.save_user(&mut user).unwrap();

        assert!(!user.is_new(), "{profile}");
        let names: Vec<_> = user.roles().iter().map(|role| role.name.as_str()).collect();
        assert_eq!(
            names,
            ["ROLE_OWNER_ADMIN", "ROLE_VET_ADMIN", "ROLE_ADMIN"],
            "{profile}"
        );
        for role in user.roles() {
            assert_eq!(role.username(), Some("admin"), "{profile}");
            assert!(role.id().is_some(), "{profile}");
        }
        assert_eq!(
            role_rows(&conn, "admin"),
            ["ROLE_ADMIN", "ROLE_OWNER_ADMIN", "ROLE_VET_ADMIN"],
            "{profile}"
        );

        let loaded = repos.users().find_by_username("admin").unwrap();
        assert_eq!(loaded.roles().len(), 3, "{profile}");
        assert!(loaded
            .roles()
            .iter()
            .all(|role| role.username() == Some("admin")));
    }
}

#[test]
fn invalid_role_name_fails_validation() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let service = UserService::new(repos.users());

        let mut user = User::new("mallory", "secret", true);
        user.add_role("OWNER ADMIN");
        let err = service.save_user(&mut user).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{profile}");
        assert!(role_rows(&conn, "mallory").is_empty(), "{profile}");
    }
}

#[test]
fn resaving_replaces_the_role_set() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let service = UserService::new(repos.users());

        let mut user = User::new("admin", "admin", true);
        user.add_role("OWNER_ADMIN");
        user.add_role("VET_ADMIN");
        service.save_user(&mut user).unwrap();
        let kept_id = user.roles()[1].id();

        let mut user = repos.users().find_by_username("admin").unwrap();
        assert!(user.remove_role("ROLE_OWNER_ADMIN"));
        user.add_role("ADMIN");
        user.enabled = false;
        service.save_user(&mut user).unwrap();

        assert_eq!(
            role_rows(&conn, "admin"),
            ["ROLE_ADMIN", "ROLE_VET_ADMIN"],
            "{profile}"
        );
        let vet_admin = user
            .roles()
            .iter()
            .find(|role| role.name == "ROLE_VET_ADMIN")
            .unwrap();
        assert_eq!(vet_admin.id(), kept_id, "{profile}");
        let enabled: bool = conn
            .query_row(
                "SELECT enabled FROM users WHERE username = 'admin';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!enabled, "{profile}");
    }
}

#[test]
fn unknown_username_is_not_found() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let err = repos.users().find_by_username("nobody").unwrap_err();
        assert!(err.is_not_found(), "{profile}");
    }
}

#[test]
fn registering_a_taken_username_fails() {
    for profile in Profile::ALL {
        let conn = open_db_in_memory().unwrap();
        let repos = Repositories::bind(profile, &conn);
        let service = UserService::new(repos.users());

        let mut first = User::new("admin", "admin", true);
        first.add_role("ADMIN");
        service.save_user(&mut first).unwrap();

        let mut second = User::new("admin", "other", true);
        second.add_role("VET_ADMIN");
        let err = service.save_user(&mut second).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage, "{profile}");
        assert_eq!(role_rows(&conn, "admin"), ["ROLE_ADMIN"], "{profile}");
    }
}
