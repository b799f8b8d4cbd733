//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::domain::repositories::UserRepository;
use crate::domain::user::{User, UserRole};
use crate::support::errors::{db_err, DomainError, DomainResult};

use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        email: m.email,
        password_hash: m.password_hash,
        role: UserRole::parse(&m.role),
        is_active: m.is_active,
        created_at: m.created_at,
        last_login: m.last_login,
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn insert(&self, u: User) -> DomainResult<User> {
        if self.find_by_username(&u.username).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "User '{}' already exists",
                u.username
            )));
        }
        let active = user::ActiveModel {
            username: Set(u.username.clone()),
            email: Set(u.email.clone()),
            password_hash: Set(u.password_hash.clone()),
            role: Set(u.role.as_str().to_string()),
            is_active: Set(u.is_active),
            created_at: Set(u.created_at),
            last_login: Set(u.last_login),
            ..Default::default()
        };
        let inserted = active.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn update(&self, u: User) -> DomainResult<()> {
        let Some(model) = user::Entity::find_by_id(u.id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: u.id.to_string(),
            });
        };

        let mut active: user::ActiveModel = model.into();
        active.email = Set(u.email);
        active.password_hash = Set(u.password_hash);
        active.role = Set(u.role.as_str().to_string());
        active.is_active = Set(u.is_active);
        active.last_login = Set(u.last_login);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}
