use clap::Parser;
use factorio_tools::cli::{Cli, Commands};
use factorio_tools::output::Printer;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let printer = Printer::new();

    match cli.command {
        Commands::Dump(args) => factorio_tools::cli::dump::run(args, cli.verbose, &printer)?,
        Commands::Paths(args) => factorio_tools::cli::paths::run(args, cli.verbose, &printer)?,
        Commands::Completions(args) => factorio_tools::cli::completions::run(args)?,
    }

    Ok(())
}

/// Log to stderr; RUST_LOG overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "factorio_tools=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
