//! SeaORM implementation of ConnectorRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::connector::Connector;
use crate::domain::repositories::ConnectorRepository;
use crate::support::errors::{db_err, DomainError, DomainResult};
use crate::support::retry::{retry_with_backoff, RetryConfig};

use crate::infrastructure::database::entities::connector;

pub struct SeaOrmConnectorRepository {
    db: DatabaseConnection,
}

impl SeaOrmConnectorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        charger_id: &str,
        connector_id: i32,
    ) -> DomainResult<Option<connector::Model>> {
        connector::Entity::find()
            .filter(connector::Column::ChargerId.eq(charger_id))
            .filter(connector::Column::ConnectorId.eq(connector_id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

fn model_to_domain(m: connector::Model) -> Connector {
    Connector {
        id: m.id,
        charger_id: m.charger_id,
        connector_id: m.connector_id,
        status: m.status,
        error_code: m.error_code,
        energy_delivered_kwh: m.energy_delivered,
        power_delivered_kw: m.power_delivered,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl ConnectorRepository for SeaOrmConnectorRepository {
    async fn find(&self, charger_id: &str, connector_id: i32) -> DomainResult<Option<Connector>> {
        Ok(self
            .find_model(charger_id, connector_id)
            .await?
            .map(model_to_domain))
    }

    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<Connector>> {
        let models = connector::Entity::find()
            .filter(connector::Column::ChargerId.eq(charger_id))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn upsert_status(
        &self,
        charger_id: &str,
        connector_id: i32,
        status: &str,
        error_code: Option<String>,
    ) -> DomainResult<()> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                let now = Utc::now();
                match self.find_model(charger_id, connector_id).await? {
                    Some(model) => {
                        let mut active: connector::ActiveModel = model.into();
                        active.status = Set(status.to_string());
                        active.error_code = Set(error_code.clone());
                        active.updated_at = Set(now);
                        active.update(&self.db).await.map(|_| ()).map_err(db_err)
                    }
                    None => {
                        let active = connector::ActiveModel {
                            charger_id: Set(charger_id.to_string()),
                            connector_id: Set(connector_id),
                            status: Set(status.to_string()),
                            error_code: Set(error_code.clone()),
                            energy_delivered: Set(0.0),
                            power_delivered: Set(0.0),
                            created_at: Set(now),
                            updated_at: Set(now),
                            ..Default::default()
                        };
                        active.insert(&self.db).await.map(|_| ()).map_err(db_err)
                    }
                }
            },
            DomainError::is_transient,
            "connector.upsert_status",
        )
        .await
    }

    async fn update_measurements(
        &self,
        charger_id: &str,
        connector_id: i32,
        energy_kwh: Option<f64>,
        power_kw: Option<f64>,
    ) -> DomainResult<()> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                let now = Utc::now();
                let model = self.find_model(charger_id, connector_id).await?;
                let mut active: connector::ActiveModel = match model {
                    Some(m) => m.into(),
                    None => connector::ActiveModel {
                        charger_id: Set(charger_id.to_string()),
                        connector_id: Set(connector_id),
                        status: Set("Available".to_string()),
                        error_code: Set(None),
                        energy_delivered: Set(0.0),
                        power_delivered: Set(0.0),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&self.db)
                    .await
                    .map_err(db_err)?
                    .into(),
                };
                if let Some(kwh) = energy_kwh {
                    active.energy_delivered = Set(kwh);
                }
                if let Some(kw) = power_kw {
                    active.power_delivered = Set(kw);
                }
                active.updated_at = Set(now);
                active.update(&self.db).await.map(|_| ()).map_err(db_err)
            },
            DomainError::is_transient,
            "connector.update_measurements",
        )
        .await
    }

    async fn delete(&self, charger_id: &str, connector_id: i32) -> DomainResult<()> {
        let Some(model) = self.find_model(charger_id, connector_id).await? else {
            return Err(DomainError::NotFound {
                entity: "Connector",
                field: "connector_id",
                value: format!("{charger_id}/{connector_id}"),
            });
        };
        connector::Entity::delete_by_id(model.id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
