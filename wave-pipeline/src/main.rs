mod loader;
mod parameters;
mod processing;
mod simulate;

use anyhow::Result;
use clap::Parser;
use ibw_common::init_tracer;
use parameters::Mode;
use tracing::{debug, level_filters::LevelFilter};

// cargo run --bin wave-pipeline -- simulate --output-path ./recordings --seed 7
// cargo run --bin wave-pipeline -- analyse --data-path ./recordings --output report.json

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Default log level, overridden by `RUST_LOG`
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    mode: Mode,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let tracer = init_tracer!(args.log_level);
    debug!("{} args: {:?}", tracer.service_name(), args);

    match &args.mode {
        Mode::Analyse(parameters) => processing::analyse(parameters),
        Mode::Simulate(parameters) => simulate::simulate(parameters),
    }
}
