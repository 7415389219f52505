//! Ring example: run a resource management scenario and print the
//! delivery statistics.
//!
//! The scenario is read from a settings file (`key = value` lines) and
//! can be tweaked from the command line:
//!
//!   RUST_LOG=info cargo run --example ring -p resman -- \
//!       --set destinationRange=0,50 --set percentageOfResHogs=10 \
//!       --duration 12h

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use resman::{Reporter, Role, World, config::Config, time::parse_duration};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
struct Command {
    /// settings file, defaults are used for every option it doesn't set
    #[arg(long)]
    config: Option<PathBuf>,

    /// override a single option, e.g. `--set intervalResHogs=60s`
    #[arg(long = "set", value_name = "OPTION=VALUE")]
    overrides: Vec<String>,

    #[arg(long)]
    seed: Option<u64>,

    /// buffer responses under their destination
    #[arg(long)]
    proxy: bool,

    /// simulated time advanced on every step
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    step: Duration,

    /// total simulated time
    #[arg(long, default_value = "1h", value_parser = parse_duration)]
    duration: Duration,
}

fn main() -> Result<()> {
    env_logger::init();

    let cmd = Command::parse();

    let mut config = match &cmd.config {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .parse::<Config>()
            .with_context(|| format!("Invalid settings in {}", path.display()))?,
        None => Config {
            destination_range: "0,20".parse()?,
            interval: Duration::from_secs(60),
            interval_res_hogs: Duration::from_secs(10),
            client_buffer_size: 2_048,
            server_buffer_size: 16_384,
            ..Config::default()
        },
    };

    for entry in &cmd.overrides {
        let (option, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Expecting `OPTION=VALUE', got `{entry}'"))?;
        config.set(option, value)?;
    }
    if let Some(seed) = cmd.seed {
        config.seed = seed;
    }
    config.simulate_proxy_signatures |= cmd.proxy;

    let mut world = World::new(config, cmd.step)?;
    let mut reporter = Reporter::default();

    for role in [Role::Server, Role::ResourceHog, Role::PlainClient] {
        let nodes: Vec<_> = world
            .applications()
            .filter(|app| app.role() == role)
            .map(|app| app.address().to_string())
            .collect();
        println!("{role}s: {}", nodes.join(", "));
    }

    world.run_until(cmd.duration, &mut reporter);

    println!();
    println!("sim_time: {}", world.now());
    println!("{reporter}");
    println!();

    for app in world.applications() {
        println!("{:>4} {:<12} {}", app.address(), app.role(), app.buffer());
    }

    Ok(())
}
