//! L2 learning switch daemon.
//!
//! Replays a scripted stream of packet-ins against an in-memory fabric.
//! Each switch's packets are handled on their own blocking task, so
//! switches run in parallel while every switch sees its packets in script
//! order.

use anyhow::{Context, bail};
use clap::Parser;
use l2switch::config::{DEFAULT_CONFIG_PATH, LoggingConfig};
use l2switch::{
    InMemoryFabric, L2SwitchConfig, LearningSwitch, PacketResult, PortId, RawPacket, Scenario,
    SwitchId,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tracing::{error, info, warn};

/// SDN L2 learning switch
#[derive(Parser, Debug)]
#[command(name = "l2switchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults are used if it does not exist)
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Packet-in replay script
    #[arg(short = 's', long)]
    scenario: PathBuf,

    /// Print the learning tables after the replay
    #[arg(long)]
    dump_table: bool,

    /// Log level, overrides the configuration file (RUST_LOG still wins)
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

/// Disposition of one replayed packet-in.
struct Replayed {
    ingress: PortId,
    result: PacketResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = L2SwitchConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    init_logging(&config.logging)?;
    info!(
        config = %args.config.display(),
        unknown_destination = ?config.forwarding.unknown_destination,
        serialization = ?config.concurrency.serialization,
        "l2switchd: Starting"
    );

    match run(&args, &config).await {
        Ok(()) => {
            info!("l2switchd: Exiting normally");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "l2switchd: Exiting with error");
            Err(e)
        }
    }
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

async fn run(args: &Args, config: &L2SwitchConfig) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    if scenario.packets.is_empty() {
        bail!("scenario {} contains no packets", args.scenario.display());
    }

    let fabric = Arc::new(scenario.build_fabric());
    let switch = Arc::new(LearningSwitch::new(config));
    switch.attach_fabric(fabric.clone());

    let shutdown = setup_signal_handlers();
    let streams = scenario.packets_by_switch();
    info!(
        switches = streams.len(),
        packets = scenario.packets.len(),
        "l2switchd: Replaying scenario"
    );

    let mut tasks = Vec::with_capacity(streams.len());
    for (dpid, packets) in streams {
        let switch = switch.clone();
        let shutdown = shutdown.clone();
        let task = tokio::task::spawn_blocking(move || replay(&switch, packets, &shutdown));
        tasks.push((dpid, task));
    }

    let mut replayed: Vec<(SwitchId, Vec<Replayed>)> = Vec::with_capacity(tasks.len());
    for (dpid, task) in tasks {
        let results = task
            .await
            .with_context(|| format!("replay task for {} failed", dpid))?;
        replayed.push((dpid, results));
    }

    if shutdown.load(Ordering::Relaxed) {
        warn!("l2switchd: Replay aborted by signal");
    }

    print_report(&switch, &fabric, &replayed, args.dump_table);
    Ok(())
}

fn replay(switch: &LearningSwitch, packets: Vec<RawPacket>, shutdown: &AtomicBool) -> Vec<Replayed> {
    let mut results = Vec::with_capacity(packets.len());
    for packet in packets {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let result = switch.receive_data_packet(&packet);
        results.push(Replayed {
            ingress: packet.ingress(),
            result,
        });
    }
    results
}

fn print_report(
    switch: &LearningSwitch,
    fabric: &InMemoryFabric,
    replayed: &[(SwitchId, Vec<Replayed>)],
    dump_table: bool,
) {
    println!("Dispositions:");
    for (dpid, results) in replayed {
        println!("  {}", dpid);
        for (index, r) in results.iter().enumerate() {
            println!("    #{:<4} in {:<24} {:?}", index, r.ingress.to_string(), r.result);
        }
    }

    println!("Installed flows:");
    for (dpid, rule) in fabric.installed_flows() {
        println!("  {} {}", dpid, rule);
    }

    if dump_table {
        println!("Learning tables:");
        for dpid in switch.learning_table().switches() {
            println!("  {}", dpid);
            for (mac, port) in switch.learning_table().entries(dpid) {
                println!("    {} -> {}", mac, port);
            }
        }
    }

    let stats = switch.stats();
    let learning = switch.learning_table().stats();
    println!("Statistics:");
    println!("  packets received      {}", stats.packets_received);
    println!("  packets ignored       {}", stats.packets_ignored);
    println!("  packets flooded       {}", stats.packets_flooded);
    println!("  packets consumed      {}", stats.packets_consumed);
    println!("  flows installed       {}", stats.flows_installed);
    println!("  install failures      {}", stats.install_failures);
    println!("  transmit failures     {}", stats.transmit_failures);
    println!("  unknown destinations  {}", stats.unknown_destinations);
    println!("  unexpected errors     {}", stats.unexpected_errors);
    println!("  tables created        {}", learning.tables_created);
    println!("  entries registered    {}", learning.entries_registered);
    println!("  entries moved         {}", learning.entries_moved);
}

/// Sets the returned flag on Ctrl-C; replay tasks stop at the next packet.
fn setup_signal_handlers() -> Arc<AtomicBool> {
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("l2switchd: Received SIGINT");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    shutdown_flag
}
