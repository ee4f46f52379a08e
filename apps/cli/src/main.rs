#![deny(warnings)]

//! Headless CLI: start a game, run it for a number of days and save it.

use anyhow::{bail, Context, Result};
use persistence::SaveEncoding;
use sim_runtime::{load_content, standard_content, Session, SPEED_MULTIPLIERS};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    content: Option<PathBuf>,
    difficulty: Option<String>,
    days: Option<i64>,
    speed: Option<usize>,
    save: Option<PathBuf>,
    encoding: SaveEncoding,
}

fn value<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.with_context(|| format!("{flag} needs a value"))?;
    raw.parse()
        .with_context(|| format!("invalid value {raw:?} for {flag}"))
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--content" => args.content = Some(value("--content", it.next())?),
            "--difficulty" => args.difficulty = Some(value("--difficulty", it.next())?),
            "--days" => args.days = Some(value("--days", it.next())?),
            "--speed" => args.speed = Some(value("--speed", it.next())?),
            "--save" => args.save = Some(value("--save", it.next())?),
            "--binary" => args.encoding = SaveEncoding::Binary,
            "--gzip" => args.encoding = SaveEncoding::JsonGz,
            other => bail!("unknown argument {other:?}"),
        }
    }
    if args.days.is_some_and(|d| d < 0) {
        bail!("--days must not be negative");
    }
    if args.speed.is_some_and(|s| s >= SPEED_MULTIPLIERS.len()) {
        bail!("--speed must be below {}", SPEED_MULTIPLIERS.len());
    }
    Ok(args)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(?args, sha = env!("GIT_SHA"), built = env!("BUILD_DATE"), "starting CLI");

    let content = match &args.content {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            load_content(&text)?
        }
        None => standard_content()?,
    };
    let difficulty = args.difficulty.as_deref().unwrap_or("normal");
    let speed = args.speed.unwrap_or(1);
    let mut session = Session::new(Arc::new(content), difficulty, speed)?;
    session.no_gui();

    let days = args.days.unwrap_or(0);
    let mut researched = Vec::new();
    for _ in 0..days {
        let report = session.give_time(sim_core::SECONDS_PER_DAY);
        researched.extend(report.techs_researched);
        if let Some(reason) = session.player().lost_game() {
            info!(?reason, "game over");
            break;
        }
    }

    let (cash_flow, cpu_flow) = session.compute_future_resource_flow()?;
    let pl = session.player();
    println!(
        "Game OK | difficulty: {} | day: {} | techs researched: {} | build: {}",
        pl.difficulty.id,
        pl.raw_sec / sim_core::SECONDS_PER_DAY,
        researched.len(),
        env!("GIT_SHA")
    );
    println!(
        "KPI | cash: {} | partial: {}s | cpu: {} (free {}) | next day: {:+} cash, {} cpu-s on jobs",
        pl.cash,
        pl.partial_cash,
        pl.total_cpu(),
        pl.effective_cpu_pool(),
        cash_flow.total,
        cpu_flow.jobs
    );

    if let Some(path) = &args.save {
        persistence::save_to_path(session.player(), path, args.encoding)
            .with_context(|| format!("saving to {}", path.display()))?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
