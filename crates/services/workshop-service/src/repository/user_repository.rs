//! User repository and the identity lookups built on it.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::conflict_on_unique;
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{CustomerIdentity, NewUser, User, UserRole, ROLE_USER};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a new user with the default role
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Change a user's role
    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;
}

/// Name and contact lookups for customers.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// `NotFound` when the user does not exist.
    async fn find_identity(&self, user_id: Uuid) -> AppResult<CustomerIdentity>;

    /// Identities of every listed user that exists; unknown ids are skipped.
    async fn find_identities(
        &self,
        user_ids: Vec<Uuid>,
    ) -> AppResult<HashMap<Uuid, CustomerIdentity>>;
}

/// Concrete implementation of UserRepository and IdentityStore
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            name: Set(user.name),
            phone: Set(user.phone),
            role: Set(ROLE_USER.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "Email"))?;
        Ok(User::from(model))
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();
        active.role = Set(role.to_string());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }
}

#[async_trait]
impl IdentityStore for UserStore {
    async fn find_identity(&self, user_id: Uuid) -> AppResult<CustomerIdentity> {
        UserRepository::find_by_id(self, user_id)
            .await?
            .map(|user| user.identity())
            .ok_or(AppError::NotFound)
    }

    async fn find_identities(
        &self,
        user_ids: Vec<Uuid>,
    ) -> AppResult<HashMap<Uuid, CustomerIdentity>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models
            .into_iter()
            .map(|model| {
                let user = User::from(model);
                (user.id, user.identity())
            })
            .collect())
    }
}
