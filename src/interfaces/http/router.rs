//! Admin API router

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::bridge::EventBridge;
use crate::application::commands::retry::SharedRetryEngine;
use crate::application::projector::SharedSessionProjector;
use crate::application::registry::SharedConnectionRegistry;
use crate::application::services::ChargePointService;
use crate::domain::repositories::RepositoryProvider;

use super::middleware::{auth_middleware, AuthState};
use super::modules::{
    auth, chargers, commands, connectors, health, logs, monitoring, rfid_cards, users,
};

/// Shared state for all admin handlers.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: SharedConnectionRegistry,
    pub engine: SharedRetryEngine,
    pub service: Arc<ChargePointService>,
    pub projector: SharedSessionProjector,
    pub bridge: Arc<EventBridge>,
    pub auth: AuthState,
    pub prometheus: PrometheusHandle,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT bearer token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OCPP Central Management System",
        description = "Admin facade of the OCPP 1.6J central system"
    ),
    paths(
        commands::handlers::remote_start,
        commands::handlers::remote_stop,
        commands::handlers::unlock_connector,
        commands::handlers::get_configuration,
        commands::handlers::set_configuration,
        commands::handlers::change_availability,
        commands::handlers::reset,
        commands::handlers::trigger_message,
        commands::handlers::clear_cache,
        commands::handlers::send_local_list,
        commands::handlers::get_local_list_version,
        commands::handlers::get_diagnostics,
        commands::handlers::set_charging_profile,
        commands::handlers::clear_charging_profile,
        commands::handlers::update_firmware,
        commands::handlers::pending_commands,
        monitoring::handlers::stats,
        monitoring::handlers::connections,
        monitoring::handlers::connection_detail,
        monitoring::handlers::connection_events,
        monitoring::handlers::connection_events_for_charger,
        monitoring::handlers::get_retry_config,
        monitoring::handlers::set_retry_config,
        monitoring::handlers::enable_retries,
        monitoring::handlers::disable_retries,
        chargers::handlers::list,
        chargers::handlers::get,
        chargers::handlers::create,
        chargers::handlers::update,
        chargers::handlers::mark_offline,
        chargers::handlers::sessions,
        connectors::handlers::list,
        connectors::handlers::delete,
        rfid_cards::handlers::list,
        rfid_cards::handlers::create,
        rfid_cards::handlers::get,
        rfid_cards::handlers::update,
        rfid_cards::handlers::delete,
        rfid_cards::handlers::status,
        users::handlers::list,
        users::handlers::create,
        auth::handlers::login,
        logs::handlers::messages,
        health::handlers::health,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "OCPP Commands", description = "Outbound commands to charge points"),
        (name = "Monitoring", description = "Connections, events and statistics"),
        (name = "Chargers", description = "Charger administration"),
        (name = "Connectors", description = "Connector administration"),
        (name = "RFID Cards", description = "Authorization cards"),
        (name = "Users", description = "Admin users"),
        (name = "Auth", description = "Authentication"),
        (name = "Logs", description = "Message logs"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

pub fn create_api_router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    let protected = Router::new()
        // Outbound commands
        .route("/api/ocpp/remote/start", post(commands::handlers::remote_start))
        .route("/api/ocpp/remote/stop", post(commands::handlers::remote_stop))
        .route("/api/ocpp/connector/unlock", post(commands::handlers::unlock_connector))
        .route("/api/ocpp/configuration/get", post(commands::handlers::get_configuration))
        .route("/api/ocpp/configuration/set", post(commands::handlers::set_configuration))
        .route("/api/ocpp/availability/change", post(commands::handlers::change_availability))
        .route("/api/ocpp/reset", post(commands::handlers::reset))
        .route("/api/ocpp/trigger", post(commands::handlers::trigger_message))
        .route("/api/ocpp/cache/clear", post(commands::handlers::clear_cache))
        .route("/api/ocpp/local_list/send", post(commands::handlers::send_local_list))
        .route(
            "/api/ocpp/local_list_version/get",
            post(commands::handlers::get_local_list_version),
        )
        .route("/api/ocpp/diagnostics/get", post(commands::handlers::get_diagnostics))
        .route(
            "/api/ocpp/charging_profile/set",
            post(commands::handlers::set_charging_profile),
        )
        .route(
            "/api/ocpp/charging_profile/clear",
            post(commands::handlers::clear_charging_profile),
        )
        .route("/api/ocpp/firmware/update", post(commands::handlers::update_firmware))
        .route("/api/ocpp/commands/pending", get(commands::handlers::pending_commands))
        // Monitoring
        .route("/api/stats", get(monitoring::handlers::stats))
        .route("/api/connections", get(monitoring::handlers::connections))
        .route(
            "/api/connections/{charger_id}",
            get(monitoring::handlers::connection_detail),
        )
        .route("/api/connection-events", get(monitoring::handlers::connection_events))
        .route(
            "/api/connection-events/{charger_id}",
            get(monitoring::handlers::connection_events_for_charger),
        )
        .route(
            "/api/retry-config/{charger_id}",
            get(monitoring::handlers::get_retry_config).post(monitoring::handlers::set_retry_config),
        )
        .route(
            "/api/retry-config/{charger_id}/enable",
            post(monitoring::handlers::enable_retries),
        )
        .route(
            "/api/retry-config/{charger_id}/disable",
            post(monitoring::handlers::disable_retries),
        )
        // CRUD
        .route("/api/chargers", get(chargers::handlers::list).post(chargers::handlers::create))
        .route(
            "/api/chargers/{charger_id}",
            get(chargers::handlers::get).put(chargers::handlers::update),
        )
        .route(
            "/api/chargers/{charger_id}/offline",
            post(chargers::handlers::mark_offline),
        )
        .route(
            "/api/chargers/{charger_id}/sessions",
            get(chargers::handlers::sessions),
        )
        .route(
            "/api/chargers/{charger_id}/connectors",
            get(connectors::handlers::list),
        )
        .route(
            "/api/chargers/{charger_id}/connectors/{connector_id}",
            delete(connectors::handlers::delete),
        )
        .route(
            "/api/rfid-cards",
            get(rfid_cards::handlers::list).post(rfid_cards::handlers::create),
        )
        .route(
            "/api/rfid-cards/{id_tag}",
            get(rfid_cards::handlers::get)
                .put(rfid_cards::handlers::update)
                .delete(rfid_cards::handlers::delete),
        )
        .route("/api/rfid-cards/{id_tag}/status", get(rfid_cards::handlers::status))
        .route("/api/users", get(users::handlers::list).post(users::handlers::create))
        .route("/api/logs/messages", get(logs::handlers::messages))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/health", get(health::handlers::health))
        .route("/metrics", get(health::handlers::metrics));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
