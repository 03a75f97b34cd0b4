//! OCPP 1.6J CSMS daemon entry point.
//!
//! Reads configuration from TOML (`$OCPP_CSMS_CONFIG` or
//! `~/.config/ocpp-csms/config.toml`), brings up persistence, the enabled
//! transports, and the minimal admin HTTP surface, and runs until a
//! shutdown signal arrives. Exit codes follow spec.md §6: 0 normal,
//! 1 config invalid, 2 persistence unavailable at startup, 3 no enabled
//! transport could start.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use ocpp_csms::application::commands::{CommandDispatcher, CommandSender, PullQueue, RelayResponder};
use ocpp_csms::application::dispatcher::Services;
use ocpp_csms::application::services::{ChargePointService, HeartbeatMonitor, HeartbeatMonitorConfig};
use ocpp_csms::application::session::{SessionRegistry, SessionStore};
use ocpp_csms::config::{default_config_path, AppConfig};
use ocpp_csms::domain::repository::{ChargerRepository, HistoryRepository, TransactionRepository};
use ocpp_csms::infrastructure::database::migrator::Migrator;
use ocpp_csms::infrastructure::database::repositories::{
    SeaOrmChargerRepository, SeaOrmHistoryRepository, SeaOrmTransactionRepository,
};
use ocpp_csms::infrastructure::database::{init_database, DatabaseConfig};
use ocpp_csms::infrastructure::relay::{NullRelay, Relay, RedisRelay};
use ocpp_csms::infrastructure::shared_registry::{NullSharedRegistry, RedisSharedRegistry, SharedRegistry};
use ocpp_csms::interfaces::http;
use ocpp_csms::interfaces::transport::pubsub::PubsubTransport;
use ocpp_csms::interfaces::transport::pull::PullTransport;
use ocpp_csms::interfaces::transport::socket::SocketTransport;
use ocpp_csms::support::errors::CsmsError;
use ocpp_csms::support::shutdown::{listen_for_shutdown_signals, ShutdownCoordinator};

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let config_path = std::env::var("OCPP_CSMS_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging.level);
            info!(path = %config_path.display(), "configuration loaded");
            cfg
        }
        Err(e) if e.is_invalid_config() => {
            init_tracing("info");
            error!(error = %e, path = %config_path.display(), "config file is present but invalid, refusing to start");
            return 1;
        }
        Err(e) => {
            init_tracing("info");
            warn!(error = %e, path = %config_path.display(), "no usable config file found, falling back to defaults");
            AppConfig::default()
        }
    };

    let node_id = app_cfg.node_id();
    info!(node_id, "starting ocpp-csms");

    let prometheus_handle = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "failed to install prometheus recorder");
            return 1;
        }
    };

    // ── Persistence ─────────────────────────────────────────────
    let db_config = DatabaseConfig { url: app_cfg.database.url.clone() };
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to connect to database");
            return 2;
        }
    };
    info!("running database migrations");
    if let Err(e) = Migrator::up(&db, None).await {
        error!(error = %e, "failed to run database migrations");
        return 2;
    }

    let chargers: Arc<dyn ChargerRepository> = Arc::new(SeaOrmChargerRepository::new(db.clone()));
    let transactions: Arc<dyn TransactionRepository> = Arc::new(SeaOrmTransactionRepository::new(db.clone()));
    let history_repo: Arc<dyn HistoryRepository> = Arc::new(SeaOrmHistoryRepository::new(db.clone()));

    // ── Distributed mode: shared registry + cross-node relay ───
    let shared_registry: Arc<dyn SharedRegistry> = if app_cfg.distributed.enabled {
        match RedisSharedRegistry::connect(&app_cfg.distributed.redis_url, node_id.clone()).await {
            Ok(r) => Arc::new(r),
            Err(e) => {
                error!(error = %e, "failed to connect shared registry to redis");
                return 2;
            }
        }
    } else {
        Arc::new(NullSharedRegistry::new(node_id.clone()))
    };

    let relay: Arc<dyn Relay> = if app_cfg.distributed.enabled {
        match RedisRelay::connect(&app_cfg.distributed.redis_url).await {
            Ok(r) => Arc::new(r.with_poll_interval(app_cfg.distributed.poll_interval_ms)),
            Err(e) => {
                error!(error = %e, "failed to connect relay to redis");
                return 2;
            }
        }
    } else {
        Arc::new(NullRelay)
    };

    // ── Session & dispatch core ─────────────────────────────────
    let session_registry = SessionRegistry::shared();
    let session_store = SessionStore::shared();
    let command_sender = CommandSender::shared(session_registry.clone());

    let services = Services::new(
        chargers.clone(),
        transactions.clone(),
        history_repo,
        session_store.clone(),
        app_cfg.charger.default_charging_rate_kw,
        app_cfg.charger.default_tariff_per_kwh,
        app_cfg.charger.heartbeat_interval_secs,
    );

    let pull_transport = if app_cfg.transports.pull {
        Some(PullTransport::shared(services.clone(), command_sender.clone()))
    } else {
        None
    };

    let command_dispatcher = Arc::new(CommandDispatcher::new(
        session_registry.clone(),
        command_sender.clone(),
        shared_registry.clone(),
        relay.clone(),
        pull_transport.clone().map(|p| p as Arc<dyn PullQueue>),
        chargers.clone(),
        transactions.clone(),
        session_store.clone(),
        app_cfg.charger.default_charging_rate_kw,
        app_cfg.charger.default_tariff_per_kwh,
        app_cfg.commands.simulate_on_disconnect,
    ));

    let charge_point_service = Arc::new(ChargePointService::new(
        chargers.clone(),
        transactions.clone(),
        command_dispatcher,
        app_cfg.commands.timeout_secs,
    ));

    // ── Shutdown coordination ───────────────────────────────────
    let shutdown_coordinator = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout_secs);
    let shutdown = shutdown_coordinator.signal();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    let heartbeat_monitor = Arc::new(HeartbeatMonitor::new(
        chargers.clone(),
        HeartbeatMonitorConfig {
            check_interval_secs: 30,
            offline_threshold_secs: app_cfg.charger.heartbeat_interval_secs * 3,
        },
    ));
    heartbeat_monitor.spawn(shutdown.clone());

    if app_cfg.distributed.enabled {
        let relay_responder = Arc::new(RelayResponder::new(
            session_registry.clone(),
            command_sender.clone(),
            relay.clone(),
        ));
        relay_responder.spawn(shutdown.clone());
    }

    // ── Transports ───────────────────────────────────────────────
    let mut started_any = false;
    let mut join_handles: Vec<tokio::task::JoinHandle<Result<(), CsmsError>>> = Vec::new();

    if app_cfg.transports.socket {
        let bind_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.socket_port);
        let socket_transport = SocketTransport::new(
            bind_addr,
            session_registry.clone(),
            services.clone(),
            command_sender.clone(),
            shared_registry.clone(),
        );
        let shutdown = shutdown.clone();
        join_handles.push(tokio::spawn(async move { socket_transport.run(shutdown).await }));
        started_any = true;
    }

    if let Some(pull_transport) = pull_transport {
        let bind_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.pull_port);
        let router = pull_transport.router();
        match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => {
                info!(addr = bind_addr, "pull transport listening");
                let shutdown = shutdown.clone();
                join_handles.push(tokio::spawn(async move {
                    axum::serve(listener, router)
                        .with_graceful_shutdown(async move { shutdown.notified().wait().await })
                        .await
                        .map_err(|e| CsmsError::Transient(e.to_string()))
                }));
                started_any = true;
            }
            Err(e) => {
                error!(error = %e, addr = bind_addr, "failed to bind pull transport");
                return 2;
            }
        }
    }

    if app_cfg.transports.pubsub {
        let (pubsub_transport, eventloop) = PubsubTransport::new(
            &app_cfg.transports.broker_host,
            app_cfg.transports.broker_port,
            &node_id,
            services.clone(),
            command_sender.clone(),
            session_registry.clone(),
        );
        let shutdown = shutdown.clone();
        join_handles.push(tokio::spawn(async move { pubsub_transport.run(eventloop, shutdown).await }));
        started_any = true;
    }

    if !started_any {
        error!("no transport enabled in configuration, refusing to start");
        return 3;
    }

    // ── Minimal admin HTTP surface ───────────────────────────────
    let admin_state = http::AppState {
        charge_points: charge_point_service,
        metrics: prometheus_handle,
    };
    let admin_router = http::router(admin_state);
    let admin_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.admin_port);
    match tokio::net::TcpListener::bind(&admin_addr).await {
        Ok(listener) => {
            info!(addr = admin_addr, "admin http surface listening");
            let shutdown = shutdown.clone();
            join_handles.push(tokio::spawn(async move {
                axum::serve(listener, admin_router)
                    .with_graceful_shutdown(async move { shutdown.notified().wait().await })
                    .await
                    .map_err(|e| CsmsError::Transient(e.to_string()))
            }));
        }
        Err(e) => {
            error!(error = %e, addr = admin_addr, "failed to bind admin http surface");
            return 2;
        }
    }

    info!("all enabled transports started, press Ctrl+C to shut down gracefully");

    shutdown_coordinator
        .shutdown_with_cleanup(|| async move {
            for handle in join_handles {
                let _ = handle.await;
            }
        })
        .await;

    info!("ocpp-csms shutdown complete");
    0
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
