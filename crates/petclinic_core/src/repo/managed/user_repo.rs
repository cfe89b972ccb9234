//! User repository for the managed backend.
//!
//! Users are keyed by username rather than a generated id, so they stay out
//! of the identity map; writes still run inside the manager's unit of work.

use super::{EntityManager, BACKEND};
use crate::model::user::User;
use crate::model::EntityId;
use crate::repo::{log_failure, placeholders_from, RepoError, RepoResult, UserRepository};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::rc::Rc;

pub struct ManagedUserRepository<'conn> {
    em: Rc<EntityManager<'conn>>,
}

impl<'conn> ManagedUserRepository<'conn> {
    pub fn new(em: Rc<EntityManager<'conn>>) -> Self {
        Self { em }
    }
}

impl UserRepository for ManagedUserRepository<'_> {
    fn find_by_username(&self, username: &str) -> RepoResult<User> {
        self.em.read_only(|em| {
            let conn = em.connection();
            let Some((password, enabled)) = conn
                .query_row(
                    "SELECT password, enabled FROM users WHERE username = ?1;",
                    [username],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
                )
                .optional()?
            else {
                return Err(RepoError::not_found("user", username));
            };

            let mut stmt =
                conn.prepare("SELECT id, role FROM roles WHERE username = ?1 ORDER BY id ASC;")?;
            let roles = stmt
                .query_map([username], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(User::restore(username.to_string(), password, enabled, roles))
        })
    }

    fn save(&self, user: &mut User) -> RepoResult<()> {
        let result = self.em.transactional(|em| {
            user.validate()?;
            let conn = em.connection();
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

            // Drop stored roles that are no longer wanted in one statement.
            let mut values = vec![Value::Text(user.username.clone())];
            values.extend(user.roles().iter().map(|role| Value::Text(role.name.clone())));
            conn.execute(
                &format!(
                    "DELETE FROM roles WHERE username = ?1 AND role NOT IN ({});",
                    placeholders_from(2, user.roles().len())
                ),
                params_from_iter(values),
            )?;

            let mut role_ids = Vec::with_capacity(user.roles().len());
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
