#![deny(warnings)]

//! Headless CLI for driving a clicker session against the economy engine.
//!
//! Every engine entry point is reachable from the command line: manual
//! clicks, producer and upgrade purchases, simulated idle time, and the
//! save/export/import/reset surface.

use anyhow::Result;
use idle_core::{Catalog, ProducerId};
use idle_econ::Purchase;
use idle_runtime::{Session, SessionConfig};
use persistence::FileStore;
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    catalog: Option<String>,
    save_dir: String,
    clicks: u64,
    buy: Vec<String>,
    upgrades: u32,
    idle_secs: u64,
    max_step: Option<u64>,
    import: Option<String>,
    export: bool,
    reset: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        catalog: None,
        save_dir: "saves".to_string(),
        clicks: 0,
        buy: vec![],
        upgrades: 0,
        idle_secs: 0,
        max_step: None,
        import: None,
        export: false,
        reset: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--catalog" => args.catalog = it.next(),
            "--save-dir" => {
                if let Some(v) = it.next() {
                    args.save_dir = v;
                }
            }
            "--clicks" => args.clicks = it.next().and_then(|s| s.parse().ok()).unwrap_or(0),
            "--buy" => {
                if let Some(v) = it.next() {
                    args.buy.push(v);
                }
            }
            "--upgrades" => args.upgrades = it.next().and_then(|s| s.parse().ok()).unwrap_or(0),
            "--idle-secs" => args.idle_secs = it.next().and_then(|s| s.parse().ok()).unwrap_or(0),
            "--max-step" => args.max_step = it.next().and_then(|s| s.parse().ok()),
            "--import" => args.import = it.next(),
            "--export" => args.export = true,
            "--reset" => args.reset = true,
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => Catalog::builtin(),
    };
    let config = SessionConfig {
        max_step: args.max_step.map(Duration::from_secs),
        ..SessionConfig::default()
    };
    let store = FileStore::new(&args.save_dir);
    let mut session = Session::new(catalog, store, config);
    info!(save_dir = %args.save_dir, "session open");

    if args.reset {
        session.reset();
        info!("progress cleared");
    }
    if let Some(token) = &args.import {
        session.import(token)?;
        info!("progress restored");
    }

    for _ in 0..args.clicks {
        session.engine_mut().click();
    }
    for raw in &args.buy {
        let id = ProducerId(raw.clone());
        match session.engine_mut().buy_producer(&id)? {
            Purchase::Bought { cost } => info!(id = %raw, cost, "producer bought"),
            Purchase::Declined { cost } => info!(id = %raw, cost, "not enough energy"),
        }
    }
    for _ in 0..args.upgrades {
        match session.engine_mut().buy_click_upgrade() {
            Purchase::Bought { cost } => info!(cost, "click upgrade bought"),
            Purchase::Declined { cost } => {
                info!(cost, "not enough energy for upgrade");
                break;
            }
        }
    }

    // Simulated passive time: two frames bracketing the idle gap.
    let start = Instant::now();
    session.frame(start);
    session.frame(start + Duration::from_secs(args.idle_secs));

    let state = session.engine().state();
    println!(
        "Session OK | energy: {:.1} | lifetime: {:.1} | eps: {:.2} | per click: {}",
        state.energy,
        state.lifetime,
        session.engine().production_rate(),
        state.click_power
    );
    for (def, rec) in session
        .engine()
        .catalog()
        .producers()
        .iter()
        .zip(&state.producers)
    {
        println!(
            "  [{}] {} | owned: {} | next cost: {}",
            def.hotkey,
            def.name,
            rec.owned,
            session.engine().producer_cost(&def.id)?
        );
    }
    println!(
        "  [u] +1 per click | next cost: {}",
        session.engine().click_upgrade_cost()
    );

    if args.export {
        println!("save token: {}", session.export()?);
    }
    session.save();
    Ok(())
}
