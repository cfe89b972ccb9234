//! User registration use case.

use crate::model::user::User;
use crate::model::ValidationError;
use crate::repo::{RepoResult, UserRepository};
use log::warn;

pub struct UserService<'r> {
    users: &'r dyn UserRepository,
}

impl<'r> UserService<'r> {
    pub fn new(users: &'r dyn UserRepository) -> Self {
        Self { users }
    }

    /// Registers or updates `user`.
    ///
    /// # Contract
    /// - A user without roles fails validation before anything is written.
    /// - Every role name is normalized to the `ROLE_` form first.
    /// - On success every role points back at the user.
    pub fn save_user(&self, user: &mut User) -> RepoResult<()> {
        let prepared = if user.roles().is_empty() {
            Err(ValidationError::MissingRoles)
        } else {
            user.normalize_roles()
        };
        if let Err(err) = prepared {
            warn!("event=user_save module=service status=rejected error={err}");
            return Err(err.into());
        }
        self.users.save(user)
    }
}
