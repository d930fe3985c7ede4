use auth_service::{
    build_router,
    config::AuthConfig,
    middleware::PathPolicy,
    services::{
        AuditService, AuthService, JwtService, MongoAuditStore, MongoCredentialStore, MongoDb,
        MongoRefreshTokenStore, MongoRevocationStore, MongoShipmentDirectory, RevocationStore,
    },
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    let db = MongoDb::connect(
        &config.mongodb.uri,
        &config.mongodb.database,
        config.store_timeout_ms,
    )
    .await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized");

    let users = Arc::new(MongoCredentialStore::new(db.clone()));
    let refresh_tokens = Arc::new(MongoRefreshTokenStore::new(db.clone()));
    let revocations = Arc::new(MongoRevocationStore::new(db.clone()));
    let shipments = Arc::new(MongoShipmentDirectory::new(db.clone()));
    let audit = AuditService::new(Arc::new(MongoAuditStore::new(db)));

    let jwt = JwtService::new(&config.jwt);
    let auth_service = AuthService::new(
        users.clone(),
        refresh_tokens.clone(),
        revocations.clone(),
        audit.clone(),
        jwt.clone(),
        config.jwt.refresh_token_expiry_days,
    );
    let path_policy = PathPolicy::from_config(&config.routing);

    let state = AppState {
        config: config.clone(),
        jwt,
        auth_service,
        audit,
        users,
        refresh_tokens,
        revocations,
        shipments,
        path_policy,
    };

    // Retention sweep: explicit revocation records are dead weight once the
    // underlying token has expired on its own.
    let sweeper = state.revocations.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match sweeper.prune_expired().await {
                Ok(0) => {}
                Ok(pruned) => tracing::info!(pruned, "Pruned expired revocation records"),
                Err(e) => tracing::warn!(error = %e, "Revocation prune failed"),
            }
        }
    });

    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
