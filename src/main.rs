use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;

use crate::config::Settings;
use crate::datasets::Appender;
use crate::places::PlacesClient;

mod config;
mod datasets;
mod geodist;
mod model;
mod places;
mod resolver;
mod utils;

#[derive(Debug, Parser)]
struct Cli {
    /// Process a random sample of this many companies instead of the
    /// whole dataset. Anything non-numeric means the whole dataset.
    sample: Option<String>,
    /// Write the csv header row before any places
    #[arg(long)]
    headers: bool,
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

// zero counts as "no sample requested", like anything non-numeric
fn sample_size(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|x| x.parse().ok()).filter(|n| *n > 0)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    eprintln!("Loading companies dataset…");
    let path = datasets::newest(&settings.data_dir, "companies")?
        .context("no companies snapshot found")?;
    let mut companies = datasets::read_companies(&path)?;

    if let Some(n) = sample_size(cli.sample.as_deref()) {
        companies.shuffle(&mut rand::thread_rng());
        companies.truncate(n);
    }

    let client = PlacesClient::new(&settings);
    let mut output = Appender::create(&datasets::output_path(&settings.data_dir))?;
    if cli.headers {
        output.write_headers()?;
    }

    let pb = utils::progress_bar(companies.len() as u64);
    for company in &companies {
        let place = resolver::closest(&client, company)?;
        println!("Writing {place:?}");
        if let Some(place) = &place {
            output.append(place)?;
        }
        pb.inc(1);
    }
    pb.finish();

    output.finish()
}
