use std::path::Path;
use std::sync::Arc;

use auth::CredentialVerifier;
use auth::TokenCodec;
use auth_service::config::Config;
use auth_service::domain::shadow::reconciler::Reconciler;
use auth_service::domain::token::models::TokenPolicy;
use auth_service::domain::token::service::TokenService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::events::FactConsumer;
use auth_service::outbound::events::KafkaDeadLetterPublisher;
use auth_service::outbound::repositories::PostgresShadowUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_facts::FactKind;
use user_facts::Topology;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        kafka_brokers = %config.kafka.brokers,
        exchange = %config.kafka.exchange,
        algorithm = %config.jwt.algorithm,
        "Configuration loaded"
    );

    // Refuse to start without a usable key pair.
    let algorithm = TokenCodec::parse_algorithm(&config.jwt.algorithm)?;
    let codec = Arc::new(TokenCodec::from_files(
        algorithm,
        Path::new(&config.jwt.private_key_path),
        Path::new(&config.jwt.public_key_path),
    )?);
    tracing::info!(algorithm = ?algorithm, "Signing keys loaded");

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let shadow_repository = Arc::new(PostgresShadowUserRepository::new(pg_pool));

    let topology = Topology::new(&config.kafka.exchange)?;
    let dead_letters = match &config.kafka.dead_letter_topic {
        Some(topic) => Some(Arc::new(KafkaDeadLetterPublisher::new(&config, topic)?)),
        None => None,
    };
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&shadow_repository),
        config.kafka.apply_timeout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut consumer_handles = Vec::with_capacity(FactKind::ALL.len());
    for kind in FactKind::ALL {
        let consumer = FactConsumer::new(
            &config,
            &topology,
            kind,
            Arc::clone(&reconciler),
            dead_letters.clone(),
        )?;
        let shutdown = shutdown_rx.clone();
        consumer_handles.push(tokio::spawn(async move {
            consumer.start_consuming(shutdown).await;
        }));
    }
    tracing::info!(
        consumers = consumer_handles.len(),
        exchange = %topology.exchange(),
        "User fact consumers started"
    );

    let policy = TokenPolicy {
        access_ttl: config.jwt.access_token_ttl(),
        refresh_ttl: config.jwt.refresh_token_ttl(),
        rotate_refresh_tokens: config.jwt.rotate_refresh_tokens,
    };
    let token_service = Arc::new(TokenService::new(
        shadow_repository,
        codec,
        CredentialVerifier::new().with_decoy()?,
        policy,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(token_service);
    let served = axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = &served {
        tracing::error!(error = %e, "Server error");
    }

    let _ = shutdown_tx.send(true);
    for handle in consumer_handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Consumer task failed");
        }
    }
    tracing::info!("Service stopped");

    served.map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
