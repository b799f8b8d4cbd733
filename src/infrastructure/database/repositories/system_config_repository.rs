//! SeaORM implementation of SystemConfigRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;

use crate::domain::repositories::SystemConfigRepository;
use crate::domain::system_config::{default_entries, SystemConfigEntry};
use crate::support::errors::{db_err, DomainResult};

use crate::infrastructure::database::entities::system_config;

pub struct SeaOrmSystemConfigRepository {
    db: DatabaseConnection,
}

impl SeaOrmSystemConfigRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: system_config::Model) -> SystemConfigEntry {
    SystemConfigEntry {
        key: m.key,
        value: m.value,
        description: m.description,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl SystemConfigRepository for SeaOrmSystemConfigRepository {
    async fn get(&self, key: &str) -> DomainResult<Option<SystemConfigEntry>> {
        let model = system_config::Entity::find_by_id(key)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn set(&self, entry: SystemConfigEntry) -> DomainResult<()> {
        let existing = system_config::Entity::find_by_id(entry.key.as_str())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        match existing {
            Some(model) => {
                let mut active: system_config::ActiveModel = model.into();
                active.value = Set(entry.value);
                if entry.description.is_some() {
                    active.description = Set(entry.description);
                }
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await.map_err(db_err)?;
            }
            None => {
                let active = system_config::ActiveModel {
                    key: Set(entry.key),
                    value: Set(entry.value),
                    description: Set(entry.description),
                    updated_at: Set(Utc::now()),
                };
                active.insert(&self.db).await.map_err(db_err)?;
            }
        }
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<SystemConfigEntry>> {
        let models = system_config::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn seed_defaults(&self) -> DomainResult<()> {
        let count = system_config::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;
        if count > 0 {
            return Ok(());
        }

        info!("Seeding default system configuration");
        for entry in default_entries() {
            self.set(entry).await?;
        }
        Ok(())
    }
}
