//! User repository over hand-written statements.

use super::BACKEND;
use crate::db::in_unit_of_work;
use crate::model::user::User;
use crate::model::EntityId;
use crate::repo::{log_failure, RepoError, RepoResult, UserRepository};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

pub struct SqlUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, user: &mut User) -> RepoResult<()> {
        user.validate()?;

        let role_ids = in_unit_of_work(self.conn, |conn| {
            if user.is_new() {
                conn.execute(
                    "INSERT INTO users (username, password, enabled) VALUES (?1, ?2, ?3);",
                    params![user.username, user.password, user.enabled],
                )?;
            } else {
                let changed = conn.execute(
                    "UPDATE users SET password = ?1, enabled = ?2 WHERE username = ?3;",
                    params![user.password, user.enabled, user.username],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found("user", &user.username));
                }
            }

            let wanted: BTreeSet<&str> =
                user.roles().iter().map(|role| role.name.as_str()).collect();
            let mut stmt = conn.prepare("SELECT id, role FROM roles WHERE username = ?1;")?;
            let stored = stmt
                .query_map([&user.username], |row| {
                    Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (id, name) in stored {
                if !wanted.contains(name.as_str()) {
                    conn.execute("DELETE FROM roles WHERE id = ?1;", [id])?;
                }
            }

            let mut role_ids = Vec::with_capacity(user.roles().len());
            for role in user.roles() {
                conn.execute(
                    "INSERT OR IGNORE INTO roles (username, role) VALUES (?1, ?2);",
                    params![user.username, role.name],
                )?;
                role_ids.push(conn.query_row(
                    "SELECT id FROM roles WHERE username = ?1 AND role = ?2;",
                    params![user.username, role.name],
                    |row| row.get::<_, EntityId>(0),
                )?);
            }
            Ok(role_ids)
        })?;

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

impl UserRepository for SqlUserRepository<'_> {
    fn find_by_username(&self, username: &str) -> RepoResult<User> {
        let row = self
            .conn
            .query_row(
                "SELECT username, password, enabled FROM users WHERE username = ?1;",
                [username],
                |row| {
                    Ok((
                        row.get::<_, String>("username")?,
                        row.get::<_, String>("password")?,
                        row.get::<_, bool>("enabled")?,
                    ))
                },
            )
            .optional()?;
        let Some((username, password, enabled)) = row else {
            return Err(RepoError::not_found("user", username));
        };

        let mut stmt = self
            .conn
            .prepare("SELECT id, role FROM roles WHERE username = ?1 ORDER BY id ASC;")?;
        let roles = stmt
            .query_map([&username], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(User::restore(username, password, enabled, roles))
    }

    fn save(&self, user: &mut User) -> RepoResult<()> {
        log_failure(BACKEND, "user_save", None, self.write(user))
    }
}
