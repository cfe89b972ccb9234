//! User repository for the convention backend.
//!
//! The user table has a natural key and the role set is replaced as a
//! whole, so neither fits the generated id-keyed CRUD. Both are written
//! with explicit statements and bypass the read cache.

use super::session::ConventionSession;
use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::user::User;
use crate::model::EntityId;
use crate::repo::{log_failure, RepoError, RepoResult, UserRepository};
use log::info;
use rusqlite::{params, OptionalExtension};
use std::rc::Rc;

pub struct ConventionUserRepository<'conn> {
    session: Rc<ConventionSession<'conn>>,
}

impl<'conn> ConventionUserRepository<'conn> {
    pub fn new(session: Rc<ConventionSession<'conn>>) -> Self {
        Self { session }
    }
}

impl UserRepository for ConventionUserRepository<'_> {
    fn find_by_username(&self, username: &str) -> RepoResult<User> {
        let conn = self.session.connection();
        let user = conn
            .query_row(
                "SELECT password, enabled FROM users WHERE username = ?1;",
                [username],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
            )
            .optional()?;
        let Some((password, enabled)) = user else {
            return Err(RepoError::not_found("user", username));
        };

        let mut stmt =
            conn.prepare("SELECT id, role FROM roles WHERE username = ?1 ORDER BY id ASC;")?;
        let roles = stmt
            .query_map([username], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(User::restore(username.to_string(), password, enabled, roles))
    }

    fn save(&self, user: &mut User) -> RepoResult<()> {
        let result = in_unit_of_work(self.session.connection(), |conn| {
            user.validate()?;
            let changed = if user.is_new() {
                conn.execute(
                    "INSERT INTO users (username, password, enabled) VALUES (?1, ?2, ?3);",
                    params![user.username, user.password, user.enabled],
                )?
            } else {
                conn.execute(
                    "UPDATE users SET password = ?1, enabled = ?2 WHERE username = ?3;",
                    params![user.password, user.enabled, user.username],
                )?
            };
            if changed == 0 {
                return Err(RepoError::not_found("user", &user.username));
            }

            let mut role_ids: Vec<EntityId> = Vec::with_capacity(user.roles().len());
            for role in user.roles() {
                let id = conn.query_row(
                    "INSERT INTO roles (username, role) VALUES (?1, ?2)
                     ON CONFLICT (username, role) DO UPDATE SET role = excluded.role
                     RETURNING id;",
                    params![user.username, role.name],
                    |row| row.get::<_, EntityId>(0),
                )?;
                role_ids.push(id);
            }

            // Every wanted role now has a row; anything else is an orphan.
            let mut stmt = conn.prepare("SELECT id FROM roles WHERE username = ?1;")?;
            let stored = stmt
                .query_map([&user.username], |row| row.get::<_, EntityId>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for id in stored {
                if !role_ids.contains(&id) {
                    conn.execute("DELETE FROM roles WHERE id = ?1;", [id])?;
                }
            }
            Ok(role_ids)
        });
        let role_ids = log_failure(BACKEND, "user_save", None, result)?;

        let username = user.username.clone();
        for (role, id) in user.roles_mut().iter_mut().zip(role_ids) {
            role.reset_id(id);
            role.attach_to_user(&username);
        }
        user.mark_persisted();
        info!(
            "event=user_save module=repo backend={BACKEND} status=ok roles={}",
            user.roles().len()
        );
        Ok(())
    }
}
