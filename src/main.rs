//! OCPP 1.6J central system entry point.
//!
//! Init order: tracing → config → metrics recorder → database (migrations,
//! seeded defaults, admin user) → repositories → services → event bus →
//! registry → retry engine → bridge → projector → liveness → listeners.
//! Shutdown runs the reverse with a bounded grace period.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use ocpp_cms::application::bridge::{BridgeConfig, EventBridge};
use ocpp_cms::application::registry::ConnectionRegistry;
use ocpp_cms::application::{
    create_event_bus, ChargePointService, LivenessMonitor, RetryEngine, SessionProjector,
};
use ocpp_cms::config::AppConfig;
use ocpp_cms::domain::repositories::RepositoryProvider;
use ocpp_cms::infrastructure::crypto::jwt::JwtConfig;
use ocpp_cms::infrastructure::crypto::password::hash_password;
use ocpp_cms::infrastructure::database::migrator::Migrator;
use ocpp_cms::infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
use ocpp_cms::interfaces::http::middleware::AuthState;
use ocpp_cms::interfaces::http::{create_api_router, AppState};
use ocpp_cms::interfaces::ws::{OcppServer, WsServerConfig};
use ocpp_cms::support::shutdown::ShutdownCoordinator;

/// Grace for in-flight handlers to finish their persistence writes.
const SHUTDOWN_GRACE_S: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Configuration & logging ────────────────────────────
    let config = match AppConfig::from_env() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
                )
                .init();
            config
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Invalid configuration: {e}");
            return Err(e.into());
        }
    };

    info!("Starting OCPP Central Management System...");

    // ── Metrics recorder (before any counter is touched) ───
    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // ── Database ───────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: config.database_url.clone(),
    };
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {e}");
        return Err(e.into());
    }

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    repos.system_config().seed_defaults().await?;
    create_default_admin(&repos).await;

    // ── Core services ──────────────────────────────────────
    let service = Arc::new(ChargePointService::new(repos.clone()).with_rate(config.rate_per_kwh));
    let event_bus = create_event_bus();
    let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
    let engine = Arc::new(RetryEngine::new(
        registry.clone(),
        repos.clone(),
        event_bus.clone(),
    ));
    let projector = Arc::new(
        SessionProjector::new(repos.clone(), registry.clone()).with_rate(config.rate_per_kwh),
    );
    let bridge = Arc::new(EventBridge::new(
        BridgeConfig {
            api_url: config.bridge.api_url.clone(),
            api_key: config.bridge.api_key.clone(),
            redis_url: config
                .bridge
                .redis_url
                .clone()
                .or_else(|| config.bridge.mq_broker_url.clone()),
            exchange: config.bridge.mq_exchange.clone(),
        },
        engine.clone(),
        service.clone(),
    ));
    let liveness = Arc::new(LivenessMonitor::new(
        repos.clone(),
        registry.clone(),
        engine.clone(),
    ));

    let jwt = JwtConfig::new(
        config.security.secret_key.clone(),
        config.security.access_token_expire_minutes,
    );

    // ── Shutdown coordination ──────────────────────────────
    let shutdown = ShutdownCoordinator::new(SHUTDOWN_GRACE_S);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── Background tasks ───────────────────────────────────
    engine.start(shutdown_signal.clone());
    bridge.start(event_bus.clone(), shutdown_signal.clone());
    projector.start(event_bus.clone(), shutdown_signal.clone());
    liveness.clone().start(shutdown_signal.clone());

    // ── Listeners ──────────────────────────────────────────
    let ws_server = OcppServer::new(
        WsServerConfig {
            host: config.websocket.host.clone(),
            port: config.websocket.port,
            subprotocols: config.websocket.subprotocols.clone(),
            ssl_certfile: config.websocket.ssl_certfile.clone(),
            ssl_keyfile: config.websocket.ssl_keyfile.clone(),
        },
        registry.clone(),
        service.clone(),
        engine.clone(),
        event_bus.clone(),
        projector.clone(),
        jwt.clone(),
        shutdown_signal.clone(),
    );

    let api_router = create_api_router(AppState {
        repos: repos.clone(),
        registry: registry.clone(),
        engine: engine.clone(),
        service: service.clone(),
        projector: projector.clone(),
        bridge: bridge.clone(),
        auth: AuthState { jwt },
        prometheus,
    });

    let api_addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("Admin API listening on http://{api_addr} (Swagger UI at /docs)");

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("Admin API received shutdown signal");
    });

    let ws_task = tokio::spawn(async move { ws_server.run().await });
    let api_task = tokio::spawn(async move { api_server.await });

    info!("All servers started");

    tokio::select! {
        result = ws_task => {
            match result {
                Ok(Ok(())) => info!("WebSocket server stopped"),
                Ok(Err(e)) => {
                    error!("WebSocket server error: {e}");
                    return Err(e.to_string().into());
                }
                Err(e) => error!("WebSocket server task panicked: {e}"),
            }
        }
        result = api_task => {
            match result {
                Ok(Ok(())) => info!("Admin API stopped"),
                Ok(Err(e)) => {
                    error!("Admin API error: {e}");
                    return Err(e.into());
                }
                Err(e) => error!("Admin API task panicked: {e}"),
            }
        }
    }

    // ── Cleanup ────────────────────────────────────────────
    shutdown_signal.trigger();
    shutdown
        .shutdown_with_cleanup(|| async {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {e}");
            }
        })
        .await;

    info!("OCPP Central Management System shutdown complete");
    Ok(())
}

/// Seed an admin user on an empty users table.
async fn create_default_admin(repos: &Arc<dyn RepositoryProvider>) {
    use ocpp_cms::domain::user::{User, UserRole};

    match repos.users().count().await {
        Ok(0) => {}
        _ => return,
    }

    info!("Creating default admin user...");
    let password_hash = match hash_password("admin") {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash admin password: {e}");
            return;
        }
    };

    match repos
        .users()
        .insert(User::new("admin", "admin@localhost", password_hash, UserRole::Admin))
        .await
    {
        Ok(user) => {
            info!("Default admin created: {}", user.username);
            warn!("Change the default admin password immediately");
        }
        Err(e) => error!("Failed to create admin user: {e}"),
    }
}
