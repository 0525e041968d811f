//! Router configuration and command-line overrides

use clap::Parser;
use router_shared::liveness;
use std::time::Duration;

/// Bus listener configuration
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Address devices connect to
    pub listen: String,
    /// Inbound messages buffered before links are back-pressured
    pub inbound_capacity: usize,
    /// Outbound lines queued per link before a non-reading link is dropped
    pub link_queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9100".into(),
            inbound_capacity: 256,
            link_queue_capacity: 256,
        }
    }
}

/// Where parameter updates go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterTarget {
    /// UDP control surface (e.g., "127.0.0.1:9000")
    Udp { address: String },
    /// Log updates only
    Log,
}

impl Default for ParameterTarget {
    fn default() -> Self {
        Self::Udp {
            address: "127.0.0.1:9000".into(),
        }
    }
}

/// Configuration for the router process
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub bus: BusConfig,
    pub parameters: ParameterTarget,
    /// Time between sweep rounds
    pub sweep_period: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            parameters: ParameterTarget::default(),
            sweep_period: Duration::from_millis(liveness::SWEEP_PERIOD_MS),
        }
    }
}

/// Command-line overrides for [`RouterConfig`]
#[derive(Parser, Debug)]
#[command(name = "device-router", version, about = "Routes device commands to action handlers")]
pub struct Cli {
    /// Address the bus listens on
    #[arg(long)]
    pub listen: Option<String>,

    /// UDP address of the parameter control surface
    #[arg(long, conflicts_with = "no_parameters")]
    pub parameter_target: Option<String>,

    /// Milliseconds between liveness sweep rounds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_period_ms: Option<u64>,

    /// Log parameter updates instead of sending them
    #[arg(long)]
    pub no_parameters: bool,
}

impl Cli {
    /// Apply the overrides on top of the defaults
    pub fn into_config(self) -> RouterConfig {
        let mut config = RouterConfig::default();

        if let Some(listen) = self.listen {
            config.bus.listen = listen;
        }
        if let Some(address) = self.parameter_target {
            config.parameters = ParameterTarget::Udp { address };
        }
        if self.no_parameters {
            config.parameters = ParameterTarget::Log;
        }
        if let Some(ms) = self.sweep_period_ms {
            config.sweep_period = Duration::from_millis(ms);
        }

        config
    }
}
