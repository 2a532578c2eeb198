use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tribesim::loader;
use tribesim_core::{step_world, Notification, WorldState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// Simulation config (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 100)]
    ticks: u32,

    /// Write the final world state to this file (JSON)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    log::info!("Starting tribesim...");

    let config = loader::load_config(args.config.as_deref())?;
    let scenario = loader::load_scenario(&args.scenario)?;
    let mut state = loader::build_world(&scenario, &config)?;
    report_notifications(&state);

    for _ in 0..args.ticks {
        let inputs = scenario.inputs_for_tick(state.tick + 1);
        state = step_world(&state, &inputs, &config);
        report_notifications(&state);

        if config.checksum_frequency > 0 && state.tick % config.checksum_frequency == 0 {
            log::info!("Tick: {} | Checksum: {:016x}", state.tick, state.checksum());
        }
        if state.quit_requested {
            log::info!("Quit requested at tick {}", state.tick);
            break;
        }
    }

    print_summary(&state);

    if let Some(path) = &args.save {
        let json = serde_json::to_string(&state)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Saved world state to {}", path.display());
    }

    Ok(())
}

fn report_notifications(state: &WorldState) {
    for n in &state.notifications {
        match n {
            Notification::RunScript {
                player,
                script,
                position,
            } => log::info!(
                "Player {}: run script {} at {:?}",
                player,
                script,
                position
            ),
            Notification::PlayMessageSound { player, fx } => {
                log::debug!("Player {}: play {}", player, fx)
            }
            Notification::PopupMessage { player, message } => {
                log::info!("Player {}: new message {:?}", player, message)
            }
        }
    }
}

fn print_summary(state: &WorldState) {
    println!(
        "Finished after {} ticks ({} ms game time)",
        state.tick, state.gametime
    );
    for player in state.players.iter() {
        let tribe = state.tribes.get(player.tribe);
        println!(
            "Player {} ({}): {} buildings, kills {}, casualties {}, military sites lost {}/defeated {}",
            player.number,
            tribe.map(|t| t.name()).unwrap_or("?"),
            player.census.total(),
            player.kills,
            player.casualties,
            player.msites_lost,
            player.msites_defeated,
        );
        let Some(tribe) = tribe else { continue };
        for index in 0..tribe.nr_wares() as u16 {
            let produced: u32 = player
                .ware_stats
                .series(index)
                .map(|s| s.iter().sum())
                .unwrap_or(0)
                + player.ware_stats.current(index).unwrap_or(0);
            if produced > 0 {
                if let Some(ware) = tribe.ware(index) {
                    println!("  {}: {}", ware.name, produced);
                }
            }
        }
    }
    println!("Checksum: {:016x}", state.checksum());
}
