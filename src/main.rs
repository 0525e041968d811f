mod command;
mod config;
mod liveness;
mod router;
mod transport;

use clap::Parser;
use command::{handlers, Dispatcher, HandlerTable};
use config::{Cli, ParameterTarget};
use liveness::{LivenessSweeper, SharedRegistry};
use router::Router;
use std::sync::Arc;
use tokio::sync::watch;
use transport::{LogParameterSink, Outbox, ParameterSink, TcpBus, UdpParameterSink};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = Cli::parse().into_config();

    info!("Device router starting");
    info!("  Bus: {}", config.bus.listen);
    info!("  Parameters: {:?}", config.parameters);
    info!("  Sweep period: {:?}", config.sweep_period);

    let (outbox, outbound_rx) = Outbox::channel();
    let mut bus = TcpBus::bind(&config.bus, outbound_rx).await?;
    info!("Bus listening on {}", bus.local_addr());

    let parameters: Arc<dyn ParameterSink> = match &config.parameters {
        ParameterTarget::Udp { address } => {
            let sink = UdpParameterSink::connect(address).await?;
            info!("Parameter sink connected to {}", sink.target());
            Arc::new(sink)
        }
        ParameterTarget::Log => Arc::new(LogParameterSink),
    };

    let mut table = HandlerTable::new();
    handlers::register_defaults(&mut table)?;
    info!("Handlers: {}", table.triggers().join(", "));

    let registry = SharedRegistry::new();
    let router = Router::new(Dispatcher::new(
        registry.clone(),
        table,
        outbox.clone(),
        parameters,
    ));
    let sweeper = LivenessSweeper::new(registry, outbox).with_period(config.sweep_period);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_shutdown = shutdown_rx.clone();
    let sweeper_task = tokio::spawn(async move {
        sweeper.run(sweeper_shutdown).await;
    });

    let router_task = tokio::spawn(async move {
        router.run(&mut bus, shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    let _ = shutdown_tx.send(true);
    let (sweeper_result, router_result) = tokio::join!(sweeper_task, router_task);
    sweeper_result?;
    router_result?;

    Ok(())
}
