// SPDX-License-Identifier: MIT OR Apache-2.0
//! `shaderio` - shading network export and import
//!
//! Command-line shell over `shaderio_core`:
//! - `export` captures the selected networks of a scene snapshot
//! - `import` rebuilds a manifest inside a scene snapshot
//! - `script` prints the equivalent reconstruction procedure
//! - `run` executes a procedure against a scene snapshot

mod app;
mod cli;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "shaderio_core=debug,shaderio_app=debug"
    } else {
        "shaderio_core=info,shaderio_app=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("shaderio v{}", env!("CARGO_PKG_VERSION"));

    match app::run(cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
