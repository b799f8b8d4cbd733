//! SeaORM implementation of MessageLogRepository
//!
//! Append-only. Writes retry once on lock contention and are then dropped
//! with a warning so the protocol hot path never stalls on logging.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::warn;

use crate::domain::message_log::{LogDirection, LogStatus, MessageLog};
use crate::domain::repositories::MessageLogRepository;
use crate::support::errors::{db_err, DomainError, DomainResult};
use crate::support::retry::{retry_with_backoff, RetryConfig};

use crate::infrastructure::database::entities::message_log;

pub struct SeaOrmMessageLogRepository {
    db: DatabaseConnection,
    dropped: AtomicU64,
}

impl SeaOrmMessageLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            dropped: AtomicU64::new(0),
        }
    }
}

fn model_to_domain(m: message_log::Model) -> MessageLog {
    MessageLog {
        id: m.id,
        charger_id: m.charger_id,
        direction: LogDirection::parse(&m.direction),
        action: m.action,
        message_id: m.message_id,
        status: LogStatus::parse(&m.status),
        processing_time_ms: m.processing_time,
        request: m.request,
        response: m.response,
        timestamp: m.timestamp,
    }
}

#[async_trait]
impl MessageLogRepository for SeaOrmMessageLogRepository {
    async fn append(&self, log: MessageLog) {
        let result = retry_with_backoff(
            RetryConfig::log_write(),
            || async {
                let active = message_log::ActiveModel {
                    charger_id: Set(log.charger_id.clone()),
                    direction: Set(log.direction.as_str().to_string()),
                    action: Set(log.action.clone()),
                    message_id: Set(log.message_id.clone()),
                    status: Set(log.status.as_str().to_string()),
                    processing_time: Set(log.processing_time_ms),
                    request: Set(log.request.clone()),
                    response: Set(log.response.clone()),
                    timestamp: Set(log.timestamp),
                    ..Default::default()
                };
                active.insert(&self.db).await.map(|_| ()).map_err(db_err)
            },
            DomainError::is_transient,
            "message_log.append",
        )
        .await;

        if let Err(e) = result {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ocpp_log_writes_dropped_total").increment(1);
            warn!(
                charger_id = %log.charger_id,
                action = %log.action,
                error = %e,
                "Dropping message log write after retry"
            );
        }
    }

    async fn list(&self, charger_id: Option<&str>, limit: u64) -> DomainResult<Vec<MessageLog>> {
        let mut query = message_log::Entity::find();
        if let Some(id) = charger_id {
            query = query.filter(message_log::Column::ChargerId.eq(id));
        }
        let models = query
            .order_by_desc(message_log::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    fn dropped_writes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
