//! Station Sim - replays a scripted economy session
//!
//! Mines a load of ore, smelts it, burns crystals in the reactor and funds a
//! turret, then prints the ledger. Useful for checking a tweaked economy file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use station_economy::core::error::Result;
use station_economy::economy::ResourceType;
use station_economy::production::{DesiredAmounts, ProductionEvent, Runner};
use station_economy::session::{SessionEvent, StationSession};
use station_economy::EconomyConfig;

/// Station Sim - scripted run of the station economy
#[derive(Parser, Debug)]
#[command(name = "station-sim")]
#[command(about = "Replay a scripted economy session and print the ledger")]
struct Args {
    /// Economy TOML file (built-in economy if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total simulated seconds
    #[arg(long, default_value_t = 120.0, value_parser = parse_seconds)]
    seconds: f32,

    /// Frame delta in seconds
    #[arg(long, default_value_t = 0.5, value_parser = parse_step)]
    step: f32,

    /// Module to place and fund
    #[arg(long, default_value = "turret")]
    module: String,

    /// Print the final snapshot as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Ore dropped by the scripted asteroid field
const ASTEROID_HAUL: [(ResourceType, u32); 3] = [
    (ResourceType::Tritium, 40),
    (ResourceType::Silver, 20),
    (ResourceType::Polonium, 12),
];

/// Most reactor units the script will order at once
const REACTOR_BATCH: u32 = 3;

/// Smallest frame delta accepted on the command line
const MIN_STEP: f32 = 0.001;

#[derive(Serialize)]
struct SiteSnapshot {
    blueprint: String,
    progress: f32,
    complete: bool,
}

#[derive(Serialize)]
struct Snapshot {
    elapsed_seconds: f32,
    balances: BTreeMap<&'static str, u32>,
    sites: Vec<SiteSnapshot>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EconomyConfig::load_from_toml(path)?,
        None => EconomyConfig::default(),
    };
    let mut session = StationSession::new(config)?;

    for (resource, amount) in ASTEROID_HAUL {
        session.collect(resource, amount);
    }

    let desired: DesiredAmounts = session
        .ledger()
        .iter()
        .filter(|(resource, _)| resource.is_raw())
        .collect();
    if session.start_conversion("smelter", desired)? {
        println!("[{:>6.1}s] smelter started", session.elapsed());
    }

    let site = session.place_module(&args.module)?;
    let frames = (args.seconds / args.step).ceil() as u64;
    let mut reactor_started = false;

    for _ in 0..frames {
        for event in session.update(args.step) {
            report(&session, &event);
            if let SessionEvent::Production(ProductionEvent::Finished { runner }) = &event {
                if runner == "smelter" && !reactor_started {
                    reactor_started = start_reactor(&mut session)?;
                }
            }
        }

        // The player keeps hitting "fund" while the site is open
        if !session.site(site)?.is_complete() {
            let receipt = session.fund_site(site)?;
            if receipt.spent > 0 {
                println!(
                    "[{:>6.1}s] funded {} with {} units ({:.0}%)",
                    session.elapsed(),
                    args.module,
                    receipt.spent,
                    session.site_progress(site)? * 100.0
                );
            }
        }
    }

    let snapshot = Snapshot {
        elapsed_seconds: session.elapsed(),
        balances: ResourceType::ALL
            .into_iter()
            .map(|r| (r.key(), session.ledger().get(r)))
            .collect(),
        sites: session
            .sites()
            .iter()
            .map(|s| SiteSnapshot {
                blueprint: s.blueprint.clone(),
                progress: s.cost.progress_fraction(),
                complete: s.is_complete(),
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!();
        println!("=== LEDGER after {:.1}s ===", snapshot.elapsed_seconds);
        for resource in ResourceType::ALL {
            println!("  {:<18} {:>6}", resource.display_name(), session.ledger().get(resource));
        }
        for site in &snapshot.sites {
            println!(
                "  site {:<13} {:>5.0}%{}",
                site.blueprint,
                site.progress * 100.0,
                if site.complete { " (complete)" } else { "" }
            );
        }
    }

    Ok(())
}

fn parse_seconds(value: &str) -> std::result::Result<f32, String> {
    let seconds: f32 = value.parse().map_err(|e| format!("{e}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("seconds must be a finite, non-negative number, got {value}"));
    }
    Ok(seconds)
}

fn parse_step(value: &str) -> std::result::Result<f32, String> {
    let step: f32 = value.parse().map_err(|e| format!("{e}"))?;
    if !step.is_finite() || step < MIN_STEP {
        return Err(format!("step must be a finite number of at least {MIN_STEP}, got {value}"));
    }
    Ok(step)
}

fn start_reactor(session: &mut StationSession) -> Result<bool> {
    let units = match session.runner("reactor")? {
        Runner::Batch(reactor) => reactor
            .recipe()
            .affordable_units(session.ledger())
            .min(REACTOR_BATCH),
        Runner::Conversion(_) => 0,
    };
    if units == 0 {
        return Ok(false);
    }
    let started = session.start_batch("reactor", units)?;
    if started {
        println!("[{:>6.1}s] reactor ordered {} units", session.elapsed(), units);
    }
    Ok(started)
}

fn report(session: &StationSession, event: &SessionEvent) {
    match event {
        SessionEvent::Production(ProductionEvent::Produced {
            runner,
            resource,
            amount,
        }) => println!(
            "[{:>6.1}s] {} produced {} {}",
            session.elapsed(),
            runner,
            amount,
            resource
        ),
        SessionEvent::Production(ProductionEvent::Finished { runner }) => {
            println!("[{:>6.1}s] {} finished", session.elapsed(), runner)
        }
        SessionEvent::ConstructionComplete { blueprint, .. } => {
            println!("[{:>6.1}s] {} construction complete", session.elapsed(), blueprint)
        }
    }
}
