//! CLI entry point, the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use hyportal_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::with_defaults(cli.data_dir)?;
    let ctx = bootstrap(config).await?;

    match command {
        Commands::Java { json } => handlers::java::execute(&ctx, json).await,
        Commands::Serve(args) => handlers::serve::execute(&ctx, args).await,
        Commands::Downloader { command } => handlers::downloader::execute(&ctx, command).await,
        Commands::Versions { command } => handlers::versions::execute(&ctx, command).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}
