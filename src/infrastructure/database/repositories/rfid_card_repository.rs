//! SeaORM implementation of RfidCardRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::repositories::RfidCardRepository;
use crate::domain::rfid_card::RfidCard;
use crate::support::errors::{db_err, DomainError, DomainResult};

use crate::infrastructure::database::entities::rfid_card;

pub struct SeaOrmRfidCardRepository {
    db: DatabaseConnection,
}

impl SeaOrmRfidCardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: rfid_card::Model) -> RfidCard {
    RfidCard {
        id: m.id,
        id_tag: m.id_tag,
        user_id: m.user_id,
        is_active: m.is_active,
        is_blocked: m.is_blocked,
        expiry_date: m.expiry_date,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl RfidCardRepository for SeaOrmRfidCardRepository {
    async fn find_by_tag(&self, id_tag: &str) -> DomainResult<Option<RfidCard>> {
        let model = rfid_card::Entity::find()
            .filter(rfid_card::Column::IdTag.eq(id_tag))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self) -> DomainResult<Vec<RfidCard>> {
        let models = rfid_card::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn insert(&self, card: RfidCard) -> DomainResult<RfidCard> {
        if self.find_by_tag(&card.id_tag).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "RFID card with id_tag '{}' already exists",
                card.id_tag
            )));
        }
        let active = rfid_card::ActiveModel {
            id_tag: Set(card.id_tag.clone()),
            user_id: Set(card.user_id.clone()),
            is_active: Set(card.is_active),
            is_blocked: Set(card.is_blocked),
            expiry_date: Set(card.expiry_date),
            created_at: Set(card.created_at),
            updated_at: Set(card.updated_at),
            ..Default::default()
        };
        let inserted = active.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn update(&self, card: RfidCard) -> DomainResult<()> {
        let Some(model) = rfid_card::Entity::find()
            .filter(rfid_card::Column::IdTag.eq(card.id_tag.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "RfidCard",
                field: "id_tag",
                value: card.id_tag,
            });
        };

        let mut active: rfid_card::ActiveModel = model.into();
        active.user_id = Set(card.user_id);
        active.is_active = Set(card.is_active);
        active.is_blocked = Set(card.is_blocked);
        active.expiry_date = Set(card.expiry_date);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id_tag: &str) -> DomainResult<()> {
        let Some(model) = rfid_card::Entity::find()
            .filter(rfid_card::Column::IdTag.eq(id_tag))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "RfidCard",
                field: "id_tag",
                value: id_tag.to_string(),
            });
        };
        rfid_card::Entity::delete_by_id(model.id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
