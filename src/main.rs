use archscan::cli::{Args, Command};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let command = Command::from_args(args);
    process::exit(command.run());
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "archscan=info" } else { "archscan=warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
