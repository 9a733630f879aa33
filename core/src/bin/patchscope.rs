//! patchscope binary: slice, inspect and extend JavaScript sources from the
//! command line. Set `RUST_LOG=debug` to see per-file decisions.

use clap::Parser;
use patchscope::cli::{run, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
