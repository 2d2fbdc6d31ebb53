#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use anyhow::{Context, Result};
use ceph_usage::{Report, Source};
use env_logger::Env;

use cli::Format;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .init();

    let args = cli::args().with_context(|| "parsing CLI args")?;

    let report = load(&args.source)?;

    let summaries = ceph_usage::summarize_all(&report);

    match args.format {
        Format::Table => {
            let table = ceph_usage::to_table(&summaries, args.unit)
                .with_context(|| "converting internal data to table")?;

            print!("{}", table);
        }
        Format::Json => {
            let json = ceph_usage::to_json(&summaries, args.unit)
                .with_context(|| "converting internal data to JSON")?;

            println!("{}", json);
        }
    }

    Ok(())
}

/// Loads the report, pointing at `ceph` permissions if it could not be run.
fn load(source: &Source) -> Result<Report> {
    match source.load() {
        Ok(report) => Ok(report),
        Err(error) if error.is_source_unavailable() => Err(error).with_context(
            || "could not get stats, check that this user may run 'ceph osd df'",
        ),
        Err(error) => Err(error)
            .with_context(|| format!("loading report from {:?}", source)),
    }
}
