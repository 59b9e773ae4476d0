//! Marketplace user registration and profile management.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::application::authorization::ensure_self;
use crate::domain::entities::{NewUser, UpdateUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

const ALREADY_REGISTERED: &str =
    "The user and/or the email introduced are already registered in the system";

/// Service for registering and managing users.
pub struct UserService<U: UserRepository> {
    repository: Arc<U>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repository: Arc<U>) -> Self {
        Self { repository }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the input is invalid.
    /// Returns [`AppError::Conflict`] if the user name or email is taken.
    pub async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        new_user.validate()?;

        if self.repository.find_by_name(&new_user.user_name).await?.is_some()
            || self.repository.find_by_email(&new_user.email).await?.is_some()
        {
            return Err(AppError::conflict(
                ALREADY_REGISTERED,
                json!({ "user_name": new_user.user_name, "email": new_user.email }),
            ));
        }

        let user = self.repository.create(new_user).await?;
        info!(user = %user.user_name, "User registered");
        Ok(user)
    }

    /// Gets a user by user name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn get(&self, user_name: &str) -> Result<User, AppError> {
        self.repository
            .find_by_name(user_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("User {user_name} not found"),
                    json!({ "user_name": user_name }),
                )
            })
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.repository.list().await
    }

    /// Updates the profile of `user_name`. Only the user itself may do so.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` is another user.
    /// Returns [`AppError::Conflict`] if the new email is already registered.
    pub async fn update(
        &self,
        actor: &User,
        user_name: &str,
        update: UpdateUser,
    ) -> Result<User, AppError> {
        update.validate()?;

        let mut user = self.get(user_name).await?;
        ensure_self(actor, &user, &format!("update user {user_name}"))?;

        if let Some(email) = update.email
            && email != user.email
        {
            if self.repository.find_by_email(&email).await?.is_some() {
                return Err(AppError::conflict(
                    ALREADY_REGISTERED,
                    json!({ "email": email }),
                ));
            }
            user.email = email;
        }
        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }
        if let Some(company) = update.company {
            user.company = Some(company);
        }

        let user = self.repository.update(user).await?;
        info!(user = %user.user_name, "User updated");
        Ok(user)
    }

    /// Deletes `user_name`. Only the user itself may do so.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` is another user.
    pub async fn delete(&self, actor: &User, user_name: &str) -> Result<(), AppError> {
        let user = self.get(user_name).await?;
        ensure_self(actor, &user, &format!("delete user {user_name}"))?;

        self.repository.delete(user.id).await?;
        info!(user = %user_name, "User deleted");
        Ok(())
    }
}
