use anyhow::{Context, Result};
use arcade_execution::{Arcade, Clock};
use arcade_node::{
    gateway::{self, Gateway, GatewaySettings},
    store::SqliteStore,
    Config, ValidatedConfig,
};
use clap::{Arg, ArgAction, Command};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tracing::{error, info, warn};

fn init_tracing(config: &ValidatedConfig) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_dry_run_report(config: &ValidatedConfig) {
    println!("dry-run report");
    println!(
        "  ports: gateway={} metrics={}",
        config.port, config.metrics_port
    );
    println!("  data_file: {}", config.data_file.display());
    println!("  worker_threads: {}", config.worker_threads);
    println!("  log_level: {} json={}", config.log_level, config.json_logs);
    println!(
        "  sessions: mailbox_size={} prompt_buffer={}",
        config.mailbox_size, config.prompt_buffer
    );
    println!(
        "  gateway: outbound_buffer={} max_message_bytes={}B send_timeout={:?}",
        config.outbound_buffer, config.max_message_bytes, config.ws_send_timeout
    );
    println!(
        "  settlement: attempts={} backoff={:?}..{:?} retry_held_every={:?}",
        config.retry.attempts,
        config.retry.initial_backoff,
        config.retry.max_backoff,
        config.retry_held_interval
    );
    println!(
        "  input_limit: {} per second, burst {}",
        config.input_rate_per_second, config.input_burst
    );
}

fn spawn_metrics_server(gateway: Arc<Gateway<SqliteStore>>, addr: SocketAddr) {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("metrics server bind failed on {addr}: {err}");
                return;
            }
        };
        let app = gateway::metrics_router(gateway);
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            error!("metrics server failed on {addr}: {err}");
        }
    });
}

/// Periodically re-drive held settlements and prune idle limiter state.
fn spawn_maintenance(gateway: Arc<Gateway<SqliteStore>>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            gateway.prune();
            let arcade = gateway.arcade();
            if arcade.pending_settlements().is_empty() {
                continue;
            }
            let applied = arcade.retry_held().await;
            let still_held = arcade.pending_settlements().len();
            if still_held > 0 {
                warn!(applied = applied.len(), still_held, "held settlements remain");
            } else {
                info!(applied = applied.len(), "held settlements drained");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn run(config: ValidatedConfig) -> Result<()> {
    let store = SqliteStore::open(&config.data_file).context("Could not open account store")?;
    let arcade = Arc::new(Arcade::new(
        Arc::new(store),
        config.arcade_config(),
        Clock::system(),
    ));
    let gateway = Arc::new(Gateway::new(
        arcade.clone(),
        GatewaySettings {
            outbound_buffer: config.outbound_buffer,
            max_message_bytes: config.max_message_bytes,
            send_timeout: config.ws_send_timeout,
            rate_per_second: config.input_rate_per_second,
            burst: config.input_burst,
        },
    ));

    spawn_metrics_server(
        gateway.clone(),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.metrics_port),
    );
    spawn_maintenance(gateway.clone(), config.retry_held_interval);

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind gateway on {addr}"))?;
    info!(%addr, "gateway listening");
    axum::serve(listener, gateway::router(gateway).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway failed")?;

    // Live sessions take their deadline transition so every stake settles.
    arcade.shutdown().await;
    let held = arcade.pending_settlements();
    if !held.is_empty() {
        let applied = arcade.retry_held().await;
        warn!(
            applied = applied.len(),
            still_held = arcade.pending_settlements().len(),
            "flushed held settlements at shutdown"
        );
    }
    info!("arcade stopped");
    Ok(())
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    // Parse arguments
    let matches = Command::new("arcade-node")
        .about("Chat bot process hosting the arcade minigame engine.")
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate config and exit without starting the gateway")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("config").long("config").required(true))
        .get_matches();
    let dry_run = matches.get_flag("dry-run");

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let config_file = std::fs::read_to_string(config_file)
        .with_context(|| format!("Could not read config file {config_file}"))?;
    let config: Config =
        serde_yaml::from_str(&config_file).context("Could not parse config file")?;

    if dry_run {
        println!("{:#?}", config.redacted_debug());
        let config = config.validate().context("Invalid config")?;
        print_dry_run_report(&config);
        println!("config ok");
        return Ok(());
    }

    let redacted = format!("{:?}", config.redacted_debug());
    let config = config.validate().context("Invalid config")?;
    init_tracing(&config);
    info!(config = %redacted, "loaded config file");

    // Initialize runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.get())
        .enable_all()
        .build()
        .context("Could not build runtime")?;
    runtime.block_on(async move {
        let result = run(config).await;
        if let Err(e) = &result {
            error!(?e, "node failed");
        }
        result
    })
}
