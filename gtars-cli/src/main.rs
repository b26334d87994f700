mod hapmatch;

use anyhow::Result;
use clap::Command;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "gtars";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Performance critical tools for detecting genotyping errors through nearest-neighbor haplotype matching.")
        .subcommand_required(true)
        .subcommand(hapmatch::cli::create_hapmatch_cli())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // HAPMATCH
        //
        Some((hapmatch::cli::HAPMATCH_CMD, matches)) => {
            hapmatch::handlers::run_hapmatch(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
