//! SeaORM implementation of ChargerRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::charger::{Charger, ChargerStatus, RetryPolicy};
use crate::domain::repositories::ChargerRepository;
use crate::support::errors::{db_err, DomainError, DomainResult};
use crate::support::retry::{retry_with_backoff, RetryConfig};

use crate::infrastructure::database::entities::charger;

pub struct SeaOrmChargerRepository {
    db: DatabaseConnection,
}

impl SeaOrmChargerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: charger::Model) -> Charger {
    Charger {
        id: m.id,
        vendor: m.vendor,
        model: m.model,
        serial_number: m.serial_number,
        firmware_version: m.firmware_version,
        status: ChargerStatus::parse(&m.status),
        last_heartbeat: m.last_heartbeat,
        last_message: m.last_message,
        is_connected: m.is_connected,
        connection_time: m.connection_time,
        disconnect_time: m.disconnect_time,
        configuration: m
            .configuration
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        retry_policy: RetryPolicy {
            max_retries: m.max_retries.max(1) as u32,
            retry_interval_s: m.retry_interval.max(1) as u32,
            enabled: m.retry_enabled,
        },
        site_id: m.site_id,
        organization_id: m.organization_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn domain_to_active(cp: &Charger) -> charger::ActiveModel {
    charger::ActiveModel {
        id: Set(cp.id.clone()),
        vendor: Set(cp.vendor.clone()),
        model: Set(cp.model.clone()),
        serial_number: Set(cp.serial_number.clone()),
        firmware_version: Set(cp.firmware_version.clone()),
        status: Set(cp.status.as_str().to_string()),
        last_heartbeat: Set(cp.last_heartbeat),
        last_message: Set(cp.last_message.clone()),
        is_connected: Set(cp.is_connected),
        connection_time: Set(cp.connection_time),
        disconnect_time: Set(cp.disconnect_time),
        configuration: Set(Some(cp.configuration.to_string())),
        max_retries: Set(cp.retry_policy.max_retries as i32),
        retry_interval: Set(cp.retry_policy.retry_interval_s as i32),
        retry_enabled: Set(cp.retry_policy.enabled),
        site_id: Set(cp.site_id.clone()),
        organization_id: Set(cp.organization_id.clone()),
        created_at: Set(cp.created_at),
        updated_at: Set(cp.updated_at),
    }
}

// ── ChargerRepository impl ──────────────────────────────────────

#[async_trait]
impl ChargerRepository for SeaOrmChargerRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Charger>> {
        let model = charger::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self) -> DomainResult<Vec<Charger>> {
        let models = charger::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn insert(&self, cp: Charger) -> DomainResult<()> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                domain_to_active(&cp)
                    .insert(&self.db)
                    .await
                    .map(|_| ())
                    .map_err(db_err)
            },
            DomainError::is_transient,
            "charger.insert",
        )
        .await
    }

    async fn update(&self, cp: Charger) -> DomainResult<()> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                let mut active = domain_to_active(&cp);
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await.map(|_| ()).map_err(db_err)
            },
            DomainError::is_transient,
            "charger.update",
        )
        .await
    }

    async fn set_connected(&self, id: &str, connected: bool) -> DomainResult<()> {
        let Some(model) = charger::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "Charger",
                field: "id",
                value: id.to_string(),
            });
        };

        let now = Utc::now();
        let mut active: charger::ActiveModel = model.into();
        active.is_connected = Set(connected);
        if connected {
            active.connection_time = Set(Some(now));
        } else {
            active.disconnect_time = Set(Some(now));
        }
        active.updated_at = Set(now);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn touch_heartbeat(&self, id: &str) -> DomainResult<()> {
        let Some(model) = charger::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "Charger",
                field: "id",
                value: id.to_string(),
            });
        };

        let now = Utc::now();
        let mut active: charger::ActiveModel = model.into();
        active.last_heartbeat = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: ChargerStatus) -> DomainResult<()> {
        charger::Entity::update_many()
            .col_expr(
                charger::Column::Status,
                sea_orm::sea_query::Expr::value(status.as_str()),
            )
            .col_expr(
                charger::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(charger::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_retry_policy(&self, id: &str, policy: RetryPolicy) -> DomainResult<()> {
        policy.validate().map_err(DomainError::Validation)?;

        let Some(model) = charger::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "Charger",
                field: "id",
                value: id.to_string(),
            });
        };

        let mut active: charger::ActiveModel = model.into();
        active.max_retries = Set(policy.max_retries as i32);
        active.retry_interval = Set(policy.retry_interval_s as i32);
        active.retry_enabled = Set(policy.enabled);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
