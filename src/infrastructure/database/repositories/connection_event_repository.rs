//! SeaORM implementation of ConnectionEventRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::warn;

use crate::domain::connection_event::{ConnectionEvent, ConnectionEventType};
use crate::domain::repositories::ConnectionEventRepository;
use crate::support::errors::{db_err, DomainError, DomainResult};
use crate::support::retry::{retry_with_backoff, RetryConfig};

use crate::infrastructure::database::entities::connection_event;

pub struct SeaOrmConnectionEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmConnectionEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: connection_event::Model) -> ConnectionEvent {
    ConnectionEvent {
        id: m.id,
        charger_id: m.charger_id,
        event_type: ConnectionEventType::parse(&m.event_type),
        connection_id: m.connection_id,
        remote_address: m.remote_address,
        subprotocol: m.subprotocol,
        reason: m.reason,
        session_duration_s: m.session_duration,
        timestamp: m.timestamp,
    }
}

#[async_trait]
impl ConnectionEventRepository for SeaOrmConnectionEventRepository {
    async fn append(&self, event: ConnectionEvent) {
        let result = retry_with_backoff(
            RetryConfig::log_write(),
            || async {
                let active = connection_event::ActiveModel {
                    charger_id: Set(event.charger_id.clone()),
                    event_type: Set(event.event_type.as_str().to_string()),
                    connection_id: Set(event.connection_id.clone()),
                    remote_address: Set(event.remote_address.clone()),
                    subprotocol: Set(event.subprotocol.clone()),
                    reason: Set(event.reason.clone()),
                    session_duration: Set(event.session_duration_s),
                    timestamp: Set(event.timestamp),
                    ..Default::default()
                };
                active.insert(&self.db).await.map(|_| ()).map_err(db_err)
            },
            DomainError::is_transient,
            "connection_event.append",
        )
        .await;

        if let Err(e) = result {
            metrics::counter!("ocpp_log_writes_dropped_total").increment(1);
            warn!(
                charger_id = %event.charger_id,
                event_type = event.event_type.as_str(),
                error = %e,
                "Dropping connection event write after retry"
            );
        }
    }

    async fn latest_for_charger(&self, charger_id: &str) -> DomainResult<Option<ConnectionEvent>> {
        let model = connection_event::Entity::find()
            .filter(connection_event::Column::ChargerId.eq(charger_id))
            .order_by_desc(connection_event::Column::Timestamp)
            .order_by_desc(connection_event::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(
        &self,
        charger_id: Option<&str>,
        limit: u64,
    ) -> DomainResult<Vec<ConnectionEvent>> {
        let mut query = connection_event::Entity::find();
        if let Some(id) = charger_id {
            query = query.filter(connection_event::Column::ChargerId.eq(id));
        }
        let models = query
            .order_by_desc(connection_event::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
