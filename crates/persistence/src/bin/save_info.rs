#![deny(warnings)]

use anyhow::Context;
use persistence::{default_save_path, read_header};
use std::fs::File;
use std::io::BufReader;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_save_path().to_string());
    let file = File::open(&path).with_context(|| format!("opening {path}"))?;
    let header = read_header(BufReader::new(file)).with_context(|| format!("reading {path}"))?;
    println!(
        "{} | format v{} | difficulty: {} | day {} ({}s)",
        path,
        header.version,
        header.difficulty,
        header.raw_sec / sim_core::SECONDS_PER_DAY,
        header.raw_sec
    );
    Ok(())
}
