//! User directory operations: registration, login, profile and role admin.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::{mask_email, normalize_email, normalize_name, validate_password};
use crate::domain::{Role, User};
use crate::error::{DomainError, RepoError};
use crate::pagination::{Page, PageRequest};
use crate::policy::{Action, Actor, Resource, authorize};
use crate::ports::{PasswordService, PostRepository, TokenService, UserRepository};

const EMAIL_TAKEN_ON_REGISTER: &str = "User already exists with this email";
const EMAIL_TAKEN_ON_UPDATE: &str = "Email is already taken";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Input for a new account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial profile update; at least one field must be set.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A user together with a freshly signed token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    admin_key: Option<String>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        admin_key: Option<String>,
    ) -> Self {
        Self {
            users,
            posts,
            passwords,
            tokens,
            admin_key,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<Session, DomainError> {
        authorize(
            &Actor::Anonymous,
            &Resource::NewUser {
                role: registration.role,
            },
            Action::Create,
        )?;

        let user = self.create_account(registration).await?;
        tracing::info!(user_id = %user.id, email = %mask_email(&user.email), "User registered");
        self.session_for(user)
    }

    /// One-time creation of the first admin account.
    pub async fn create_first_admin(
        &self,
        admin_key: &str,
        registration: Registration,
    ) -> Result<Session, DomainError> {
        authorize(&Actor::Anonymous, &Resource::AdminBootstrap, Action::Create)?;

        let Some(expected) = self.admin_key.as_deref() else {
            return Err(DomainError::Forbidden(
                "Admin creation is disabled".to_string(),
            ));
        };

        // Racing bootstrap calls can both pass this check.
        if self.users.count_by_role(Role::Admin).await? > 0 {
            return Err(DomainError::InvalidState("Admin already exists".to_string()));
        }
        if admin_key != expected {
            tracing::warn!("Rejected admin bootstrap with a wrong key");
            return Err(DomainError::Forbidden(
                "Invalid admin creation key".to_string(),
            ));
        }

        let user = self
            .create_account(Registration {
                role: Role::Admin,
                ..registration
            })
            .await?;
        tracing::info!(user_id = %user.id, "First admin created");
        self.session_for(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let email = normalize_email(email)?;
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!(email = %mask_email(&email), "Login for unknown email");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(user)
    }

    /// Resolve a bearer token to its user.
    ///
    /// A bad or expired token is an error. A valid token whose user has since
    /// been deleted resolves to `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, DomainError> {
        let claims = self.tokens.validate_token(token)?;
        Ok(self.users.find_by_id(claims.user_id).await?)
    }

    pub async fn profile(&self, caller: &User) -> Result<User, DomainError> {
        authorize(
            &Actor::from(caller),
            &Resource::User { id: caller.id },
            Action::Read,
        )?;
        self.users
            .find_by_id(caller.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub async fn update_profile(
        &self,
        caller: &User,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        authorize(
            &Actor::from(caller),
            &Resource::User { id: caller.id },
            Action::Update,
        )?;
        if changes.name.is_none() && changes.email.is_none() {
            return Err(DomainError::validation(
                "At least one of name or email is required",
            ));
        }

        let mut user = self
            .users
            .find_by_id(caller.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;

        if let Some(name) = changes.name {
            user.name = normalize_name(&name)?;
        }
        if let Some(email) = changes.email {
            let email = normalize_email(&email)?;
            if email != user.email {
                if let Some(other) = self.users.find_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(DomainError::Conflict(EMAIL_TAKEN_ON_UPDATE.to_string()));
                    }
                }
                user.email = email;
            }
        }
        user.updated_at = Utc::now();

        let user = self
            .users
            .update(user)
            .await
            .map_err(|e| unique_clash(e, EMAIL_TAKEN_ON_UPDATE))?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    pub async fn list_users(
        &self,
        caller: &User,
        page: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        authorize(&Actor::from(caller), &Resource::Users, Action::List)?;
        let page = page.clamped();
        let (users, total) = self.users.list(page).await?;
        Ok(Page::new(users, total, page))
    }

    pub async fn change_role(
        &self,
        caller: &User,
        target_id: Uuid,
        role: Role,
    ) -> Result<User, DomainError> {
        authorize(
            &Actor::from(caller),
            &Resource::User { id: target_id },
            Action::ChangeRole(role),
        )?;

        let mut user = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        user.role = role;
        user.updated_at = Utc::now();

        let user = self.users.update(user).await?;
        tracing::info!(user_id = %user.id, role = %role, by = %caller.id, "Role changed");
        Ok(user)
    }

    /// Delete an account together with the posts it authored.
    pub async fn delete_user(&self, caller: &User, target_id: Uuid) -> Result<(), DomainError> {
        authorize(
            &Actor::from(caller),
            &Resource::User { id: target_id },
            Action::Delete,
        )?;

        if self.users.find_by_id(target_id).await?.is_none() {
            return Err(DomainError::not_found("User"));
        }

        let removed = self.posts.delete_by_author(target_id).await?;
        self.users.delete(target_id).await?;
        tracing::info!(user_id = %target_id, posts_removed = removed, by = %caller.id, "User deleted");
        Ok(())
    }

    async fn create_account(&self, registration: Registration) -> Result<User, DomainError> {
        let name = normalize_name(&registration.name)?;
        let email = normalize_email(&registration.email)?;
        validate_password(&registration.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict(EMAIL_TAKEN_ON_REGISTER.to_string()));
        }

        let password_hash = self.passwords.hash(&registration.password)?;
        let user = User::new(name, email, password_hash, registration.role);
        self.users
            .insert(user)
            .await
            .map_err(|e| unique_clash(e, EMAIL_TAKEN_ON_REGISTER))
    }

    fn session_for(&self, user: User) -> Result<Session, DomainError> {
        let token = self.tokens.generate_token(user.id, &user.email, user.role)?;
        Ok(Session {
            user,
            token,
            expires_in: self.tokens.expiration_seconds(),
        })
    }
}

/// A unique-index hit that slipped past the pre-check reads as the same
/// conflict the pre-check would have reported.
fn unique_clash(err: RepoError, message: &str) -> DomainError {
    match err {
        RepoError::Constraint(_) => DomainError::Conflict(message.to_string()),
        other => other.into(),
    }
}
