//! SeaORM implementation of SessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::repositories::SessionRepository;
use crate::domain::session::{ChargingSession, SessionStatus};
use crate::support::errors::{db_err, DomainError, DomainResult};
use crate::support::retry::{retry_with_backoff, RetryConfig};

use crate::infrastructure::database::entities::session;

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: session::Model) -> ChargingSession {
    ChargingSession {
        id: m.id,
        transaction_id: m.transaction_id,
        charger_id: m.charger_id,
        connector_id: m.connector_id,
        id_tag: m.id_tag,
        user_id: m.user_id,
        start_time: m.start_time,
        stop_time: m.stop_time,
        duration_s: m.duration,
        energy_delivered_kwh: m.energy_delivered,
        cost: m.cost,
        status: SessionStatus::parse(&m.status),
        meter_start: m.meter_start,
        meter_stop: m.meter_stop,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn domain_to_active(s: &ChargingSession) -> session::ActiveModel {
    session::ActiveModel {
        transaction_id: Set(s.transaction_id),
        charger_id: Set(s.charger_id.clone()),
        connector_id: Set(s.connector_id),
        id_tag: Set(s.id_tag.clone()),
        user_id: Set(s.user_id.clone()),
        start_time: Set(s.start_time),
        stop_time: Set(s.stop_time),
        duration: Set(s.duration_s),
        energy_delivered: Set(s.energy_delivered_kwh),
        cost: Set(s.cost),
        status: Set(s.status.as_str().to_string()),
        meter_start: Set(s.meter_start),
        meter_stop: Set(s.meter_stop),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
        ..Default::default()
    }
}

// ── SessionRepository impl ──────────────────────────────────────

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn insert(&self, s: ChargingSession) -> DomainResult<ChargingSession> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                let inserted = domain_to_active(&s).insert(&self.db).await.map_err(db_err)?;
                Ok(model_to_domain(inserted))
            },
            DomainError::is_transient,
            "session.insert",
        )
        .await
    }

    async fn update(&self, s: ChargingSession) -> DomainResult<()> {
        retry_with_backoff(
            RetryConfig::default(),
            || async {
                let mut active = domain_to_active(&s);
                active.id = Set(s.id);
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await.map(|_| ()).map_err(db_err)
            },
            DomainError::is_transient,
            "session.update",
        )
        .await
    }

    async fn find_by_transaction(
        &self,
        charger_id: &str,
        transaction_id: i32,
    ) -> DomainResult<Option<ChargingSession>> {
        let model = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .filter(session::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_active_for_charger(
        &self,
        charger_id: &str,
    ) -> DomainResult<Vec<ChargingSession>> {
        let models = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()))
            .order_by_desc(session::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn has_active_for_connector(
        &self,
        charger_id: &str,
        connector_id: i32,
    ) -> DomainResult<bool> {
        let model = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .filter(session::Column::ConnectorId.eq(connector_id))
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()))
            .limit(1)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.is_some())
    }

    async fn max_transaction_id(&self, charger_id: &str) -> DomainResult<Option<i32>> {
        let models = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().filter_map(|m| m.transaction_id).max())
    }

    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<ChargingSession>> {
        let models = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .order_by_desc(session::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn started_since(
        &self,
        charger_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ChargingSession>> {
        let models = session::Entity::find()
            .filter(session::Column::ChargerId.eq(charger_id))
            .filter(session::Column::StartTime.gte(since))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
