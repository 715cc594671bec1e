//! Headless runner: drives a simulation in real time and logs its statistics.

mod telemetry;

use anyhow::{Context, Result};
use evo_core::RunnerConfig;
use evo_world::{ControlHandle, Simulation, StopReason, TracingSink};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

const CONFIG_ENV: &str = "EVO_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    telemetry::init_telemetry(config.log_format)?;

    info!(
        seed = config.simulation.seed,
        speed = config.speed,
        max_ticks = ?config.max_ticks,
        quit_on_extinct = config.quit_on_extinct,
        "Starting evo runner"
    );

    let control = ControlHandle::new(config.speed);
    let mut sim = Simulation::new(config.simulation.clone())
        .context("failed to build simulation")?
        .with_control(control.clone());
    sim.add_sink(Box::new(TracingSink));

    let stopper = control.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        stopper.request_stop();
    });

    let reason = run_loop(&mut sim, &control, &config).await;
    let summary = sim.summary(sim.tick(), reason);
    summary.log();

    info!("Shutting down runner");
    Ok(())
}

fn load_config() -> Result<RunnerConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            RunnerConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => Ok(RunnerConfig::default()),
    }
}

/// Step once per interval tick until something stops the run.
/// The interval is rebuilt whenever the control speed changes.
async fn run_loop(sim: &mut Simulation, control: &ControlHandle, config: &RunnerConfig) -> StopReason {
    let mut period = control.tick_period();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if control.is_stopped() {
            return StopReason::Stopped;
        }
        if config.max_ticks.is_some_and(|max| sim.tick() >= max) {
            return StopReason::MaxTicks;
        }
        if config.quit_on_extinct && sim.is_extinct() {
            info!(tick = sim.tick(), "Population extinct");
            return StopReason::Extinct;
        }

        sim.step();

        if sim.tick() % 1000 == 0 {
            info!(
                "Tick {}: {} creatures, {} food",
                sim.tick(),
                sim.world().creature_count(),
                sim.world().food_count()
            );
        }

        let current = control.tick_period();
        if current != period {
            debug!(speed = control.speed(), "Speed changed");
            period = current;
            ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
